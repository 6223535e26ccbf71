use serde_json::Value;

use super::discriminator;
use super::logging::{resolve, resolve_options};
use crate::config::errors::{ConfigError, ErrorList, VariantFamily};
use crate::config::schema::{
    ConsoleLogOptions, ConsoleLoggerConfig, LogPreset, Middleware, MiddlewareKind,
};
use crate::decode::skeleton::{ConsoleLoggerSkeleton, MiddlewareSkeleton};

pub(super) fn process_middlewares(
    nodes: &[Value],
    skeletons: Vec<MiddlewareSkeleton>,
    endpoint: &str,
    errors: &mut ErrorList,
) -> Vec<Middleware> {
    let mut middlewares = Vec::with_capacity(skeletons.len());

    for (index, (node, skel)) in nodes.iter().zip(skeletons).enumerate() {
        let Some(node) = node.as_object() else {
            errors.push(ConfigError::malformed(format!("middleware in {}", endpoint), index));
            continue;
        };

        let context = if skel.id.is_empty() {
            format!("middleware {} in {}", index, endpoint)
        } else {
            format!("middleware '{}' in {}", skel.id, endpoint)
        };

        let kind = match discriminator(node, "type").as_deref() {
            Some("console_logger") => {
                MiddlewareKind::ConsoleLogger(console_logger(skel.console_logger, &context, errors))
            }
            Some("headers") => MiddlewareKind::Headers(skel.headers),
            Some(other) => {
                errors.push(ConfigError::unsupported(
                    &context,
                    VariantFamily::MiddlewareType,
                    other,
                ));
                MiddlewareKind::Unspecified
            }
            None => MiddlewareKind::Unspecified,
        };

        middlewares.push(Middleware { id: skel.id, kind });
    }

    middlewares
}

fn console_logger(
    skel: ConsoleLoggerSkeleton,
    context: &str,
    errors: &mut ErrorList,
) -> ConsoleLoggerConfig {
    let preset = resolve(
        skel.preset.as_deref(),
        LogPreset::parse,
        VariantFamily::LogPreset,
        context,
        errors,
    );
    let (format, level) = resolve_options(&skel.options, context, errors);

    ConsoleLoggerConfig {
        preset,
        options: ConsoleLogOptions { format, level },
        fields: skel.fields,
        output: skel.output.filter(|o| !o.is_empty()),
        include_only_paths: skel.include_only_paths,
        exclude_paths: skel.exclude_paths,
        include_only_methods: skel.include_only_methods,
        exclude_methods: skel.exclude_methods,
    }
}
