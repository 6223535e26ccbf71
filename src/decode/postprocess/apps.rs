//! Application payloads and script evaluators.
//!
//! A script block names its evaluator by key (`risor`, `starlark`, `extism`).
//! The first evaluator key in document order wins; any other table-valued key
//! is an unsupported evaluator.

use serde_json::{Map, Value};

use super::listeners::duration_field;
use super::{array, discriminator, entity_context, static_data, table};
use crate::config::errors::{ConfigError, ErrorList, VariantFamily};
use crate::config::schema::{
    AppDefinition, AppKind, CompositeScriptApp, EchoApp, Evaluator, ExtismEvaluator, McpApp,
    McpTool, RisorEvaluator, ScriptApp, Source, StarlarkEvaluator, DEFAULT_EVALUATOR_TIMEOUT,
};
use crate::decode::skeleton::{
    AppSkeleton, EvaluatorSkeleton, McpSkeleton, McpToolSkeleton, ScriptSkeleton,
};

const EVALUATOR_KEYS: [&str; 3] = ["risor", "starlark", "extism"];

pub(super) fn process_apps(
    nodes: &[Value],
    skeletons: Vec<AppSkeleton>,
    errors: &mut ErrorList,
) -> Vec<AppDefinition> {
    let mut apps = Vec::with_capacity(skeletons.len());

    for (index, (node, skel)) in nodes.iter().zip(skeletons).enumerate() {
        let Some(node) = node.as_object() else {
            errors.push(ConfigError::malformed("app", index));
            continue;
        };

        let context = entity_context("app", index, &skel.id);
        let kind = match discriminator(node, "type").as_deref() {
            Some("echo") => AppKind::Echo(EchoApp {
                response: skel.echo.response,
            }),
            Some("script") => AppKind::Script(script_app(
                table(node, "script"),
                &skel.script,
                &context,
                errors,
            )),
            Some("composite_script") => AppKind::CompositeScript(CompositeScriptApp {
                script_app_ids: skel.composite_script.script_app_ids,
                static_data: static_data(table(node, "composite_script"), &context, errors),
            }),
            Some("mcp") => AppKind::Mcp(mcp_app(table(node, "mcp"), skel.mcp, &context, errors)),
            Some(other) => {
                errors.push(ConfigError::unsupported(&context, VariantFamily::AppType, other));
                AppKind::Unspecified
            }
            None => {
                errors.push(ConfigError::MissingDiscriminator {
                    context: context.clone(),
                    family: VariantFamily::AppType,
                });
                AppKind::Unspecified
            }
        };

        apps.push(AppDefinition { id: skel.id, kind });
    }

    apps
}

fn script_app(
    node: Option<&Map<String, Value>>,
    skel: &ScriptSkeleton,
    context: &str,
    errors: &mut ErrorList,
) -> ScriptApp {
    let mut chosen: Vec<&str> = Vec::new();
    for (key, value) in node.into_iter().flatten() {
        if key == "static_data" {
            continue;
        }
        if let Some(known) = EVALUATOR_KEYS.iter().find(|k| **k == key.as_str()) {
            chosen.push(*known);
        } else if value.is_object() {
            errors.push(ConfigError::unsupported(context, VariantFamily::Evaluator, key.as_str()));
        }
    }

    if chosen.len() > 1 {
        errors.push(ConfigError::AmbiguousVariant {
            context: context.to_string(),
            family: VariantFamily::Evaluator,
            choices: chosen.iter().map(|k| k.to_string()).collect(),
        });
    }

    let evaluator = chosen
        .first()
        .and_then(|key| skel.evaluator(key).map(|eval| (*key, eval)))
        .map(|(key, eval)| build_evaluator(key, eval, context, errors));

    ScriptApp {
        evaluator,
        static_data: static_data(node, context, errors),
    }
}

fn build_evaluator(
    key: &str,
    skel: &EvaluatorSkeleton,
    context: &str,
    errors: &mut ErrorList,
) -> Evaluator {
    let source = resolve_source(skel);
    match key {
        "starlark" => Evaluator::Starlark(StarlarkEvaluator {
            source,
            timeout: duration_field(
                skel.timeout.as_deref(),
                DEFAULT_EVALUATOR_TIMEOUT,
                context,
                "timeout",
                errors,
            ),
        }),
        "extism" => Evaluator::Extism(ExtismEvaluator {
            source,
            entrypoint: skel.entrypoint.clone().unwrap_or_default(),
        }),
        _ => Evaluator::Risor(RisorEvaluator {
            source,
            timeout: duration_field(
                skel.timeout.as_deref(),
                DEFAULT_EVALUATOR_TIMEOUT,
                context,
                "timeout",
                errors,
            ),
        }),
    }
}

/// Inline code takes precedence over a URI.
fn resolve_source(skel: &EvaluatorSkeleton) -> Option<Source> {
    let non_empty = |s: &Option<String>| s.as_ref().filter(|v| !v.is_empty()).cloned();
    non_empty(&skel.code)
        .map(Source::Code)
        .or_else(|| non_empty(&skel.uri).map(Source::Uri))
}

fn mcp_app(
    node: Option<&Map<String, Value>>,
    skel: McpSkeleton,
    context: &str,
    errors: &mut ErrorList,
) -> McpApp {
    let mut tools = Vec::with_capacity(skel.tools.len());
    for (index, (tool_node, tool_skel)) in array(node, "tools").iter().zip(skel.tools).enumerate() {
        let Some(tool_node) = tool_node.as_object() else {
            errors.push(ConfigError::malformed(format!("tool in {}", context), index));
            continue;
        };
        tools.push(mcp_tool(tool_node, tool_skel, index, context, errors));
    }

    McpApp {
        server_name: skel.server_name,
        server_version: skel.server_version,
        transport: skel.transport,
        tools,
    }
}

fn mcp_tool(
    node: &Map<String, Value>,
    skel: McpToolSkeleton,
    index: usize,
    app: &str,
    errors: &mut ErrorList,
) -> McpTool {
    let context = format!("{} in {}", entity_context("tool", index, &skel.name), app);

    let script = match (&skel.script, node.contains_key("builtin")) {
        (Some(script), _) => Some(script_app(table(node, "script"), script, &context, errors)),
        (None, true) => {
            errors.push(ConfigError::unsupported(&context, VariantFamily::ToolHandler, "builtin"));
            None
        }
        (None, false) => {
            errors.push(ConfigError::MissingDiscriminator {
                context: context.clone(),
                family: VariantFamily::ToolHandler,
            });
            None
        }
    };

    McpTool {
        name: skel.name,
        description: skel.description,
        input_schema: skel.input_schema,
        script,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::errors::ErrorKind;
    use crate::decode::skeleton::ConfigSkeleton;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;

    fn run(doc: Value) -> (Vec<AppDefinition>, ErrorList) {
        let skeleton = ConfigSkeleton::deserialize(&doc).unwrap();
        let nodes = doc["apps"].as_array().cloned().unwrap_or_default();
        let mut errors = ErrorList::new();
        let apps = process_apps(&nodes, skeleton.apps, &mut errors);
        (apps, errors)
    }

    fn script(app: &AppDefinition) -> &ScriptApp {
        match &app.kind {
            AppKind::Script(script) => script,
            other => panic!("expected script app, got {:?}", other),
        }
    }

    #[test]
    fn test_code_wins_over_uri() {
        let (apps, errors) = run(json!({
            "apps": [{
                "id": "s",
                "type": "script",
                "script": {
                    "static_data": {"greeting": "hi"},
                    "risor": {"code": "print(1)", "uri": "file:///x.risor", "timeout": "5s"}
                }
            }]
        }));

        assert!(errors.is_empty());
        let app = script(&apps[0]);
        let Some(Evaluator::Risor(eval)) = &app.evaluator else {
            panic!("expected risor evaluator");
        };
        assert_eq!(eval.source, Some(Source::Code("print(1)".into())));
        assert_eq!(eval.timeout, Duration::from_secs(5));
        assert_eq!(app.static_data.get("greeting"), Some(&json!("hi")));
    }

    #[test]
    fn test_uri_used_when_code_empty() {
        let (apps, _) = run(json!({
            "apps": [{
                "id": "s",
                "type": "script",
                "script": {"extism": {
                    "code": "",
                    "uri": "https://plugins/x.wasm",
                    "entrypoint": "handle"
                }}
            }]
        }));

        let Some(Evaluator::Extism(eval)) = &script(&apps[0]).evaluator else {
            panic!("expected extism evaluator");
        };
        assert_eq!(eval.source, Some(Source::Uri("https://plugins/x.wasm".into())));
        assert_eq!(eval.entrypoint, "handle");
    }

    #[test]
    fn test_starlark_default_timeout() {
        let (apps, _) = run(json!({
            "apps": [{"id": "s", "type": "script", "script": {"starlark": {"code": "x = 1"}}}]
        }));

        let Some(Evaluator::Starlark(eval)) = &script(&apps[0]).evaluator else {
            panic!("expected starlark evaluator");
        };
        assert_eq!(eval.timeout, DEFAULT_EVALUATOR_TIMEOUT);
    }

    #[test]
    fn test_evaluator_choice_errors() {
        let (apps, errors) = run(json!({
            "apps": [
                {
                    "id": "two",
                    "type": "script",
                    "script": {"starlark": {"code": "a"}, "risor": {"code": "b"}}
                },
                {"id": "py", "type": "script", "script": {"python": {"code": "c"}}}
            ]
        }));

        assert!(errors.has(ErrorKind::AmbiguousVariant));
        assert!(errors.has(ErrorKind::UnsupportedKind));
        assert_eq!(script(&apps[0]).evaluator.as_ref().unwrap().key(), "starlark");
        assert!(script(&apps[1]).evaluator.is_none());
    }

    #[test]
    fn test_missing_and_unknown_app_type() {
        let (apps, errors) = run(json!({
            "apps": [
                {"id": "a"},
                {"id": "b", "type": "lambda"},
                {"id": "c", "type": "echo", "echo": {"response": "pong"}}
            ]
        }));

        assert_eq!(apps.len(), 3);
        assert!(errors.has(ErrorKind::MissingDiscriminator));
        assert!(errors.has(ErrorKind::UnsupportedKind));
        assert_eq!(apps[2].kind, AppKind::Echo(EchoApp { response: "pong".into() }));
    }

    #[test]
    fn test_composite_script() {
        let (apps, errors) = run(json!({
            "apps": [{
                "id": "chain",
                "type": "composite_script",
                "composite_script": {"script_app_ids": ["a", "b"], "static_data": {"n": 1}}
            }]
        }));

        assert!(errors.is_empty());
        let AppKind::CompositeScript(app) = &apps[0].kind else {
            panic!("expected composite script");
        };
        assert_eq!(app.script_app_ids, ["a", "b"]);
        assert_eq!(app.static_data.get("n"), Some(&json!(1)));
    }

    #[test]
    fn test_mcp_tools() {
        let (apps, errors) = run(json!({
            "apps": [{
                "id": "tools",
                "type": "mcp",
                "mcp": {
                    "server_name": "gw",
                    "transport": {"sse_enabled": true},
                    "tools": [
                        {"name": "calc", "script": {"risor": {"uri": "file:///calc.risor"}}},
                        {"name": "native", "builtin": {"kind": "echo"}},
                        {"name": "nothing"}
                    ]
                }
            }]
        }));

        let AppKind::Mcp(app) = &apps[0].kind else {
            panic!("expected mcp app");
        };
        assert_eq!(app.server_name, "gw");
        assert!(app.transport.as_ref().unwrap().sse_enabled);
        assert_eq!(app.tools.len(), 3);
        assert!(app.tools[0].script.is_some());
        assert!(app.tools[1].script.is_none());
        assert_eq!(errors.len(), 2);
        assert!(errors.has(ErrorKind::UnsupportedKind));
        assert!(errors.has(ErrorKind::MissingDiscriminator));
    }
}
