//! Configuration validation.
//!
//! # Responsibilities
//! - Required fields (IDs, addresses, listener references, routes, app IDs)
//! - Uniqueness of IDs within each collection
//! - Every oneof resolved to a concrete arm
//! - Script apps carry an evaluator with a source
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CanonicalConfig → Result<(), Vec<ValidationError>>
//! - Referential integrity is reported by `CanonicalConfig::dangling_references`, not here
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use crate::config::errors::{ValidationCategory, ValidationError};
use crate::config::schema::{
    AppDefinition, AppKind, CanonicalConfig, Endpoint, Listener, ListenerKind, Middleware,
    MiddlewareKind, Route, ScriptApp,
};

/// Endpoint ID prefixes that may be declared without routes.
const ROUTELESS_ENDPOINT_PREFIXES: [&str; 2] = ["test", "empty"];

/// Validate a decoded configuration.
pub fn validate_config(config: &CanonicalConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_unique("listener", config.listeners.iter().map(|l| l.id.as_str()), &mut errors);
    for (index, listener) in config.listeners.iter().enumerate() {
        validate_listener(listener, index, &mut errors);
    }

    validate_unique("endpoint", config.endpoints.iter().map(|e| e.id.as_str()), &mut errors);
    for (index, endpoint) in config.endpoints.iter().enumerate() {
        validate_endpoint(endpoint, index, &mut errors);
    }

    validate_unique("app", config.apps.iter().map(|a| a.id.as_str()), &mut errors);
    for (index, app) in config.apps.iter().enumerate() {
        validate_app(app, index, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn error(category: ValidationCategory, context: String) -> ValidationError {
    ValidationError::new(category, context)
}

/// Report each non-empty ID that appears more than once, once.
fn validate_unique<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in ids.filter(|id| !id.is_empty()) {
        if !seen.insert(id) && reported.insert(id) {
            errors.push(error(
                ValidationCategory::DuplicateId,
                format!("{} ID '{}' is used more than once", kind, id),
            ));
        }
    }
}

fn validate_listener(listener: &Listener, index: usize, errors: &mut Vec<ValidationError>) {
    if listener.id.is_empty() {
        errors.push(error(
            ValidationCategory::EmptyId,
            format!("listener at index {} has an empty ID", index),
        ));
        return;
    }

    if listener.address.is_empty() {
        errors.push(error(
            ValidationCategory::MissingRequiredField,
            format!("listener '{}' has an empty address", listener.id),
        ));
    }

    if listener.kind == ListenerKind::Unspecified {
        errors.push(error(
            ValidationCategory::InvalidValue,
            format!("listener '{}' has no supported type", listener.id),
        ));
    }
}

/// Placeholder endpoints that are allowed to have no routes.
fn is_routeless_exempt(endpoint: &Endpoint) -> bool {
    ROUTELESS_ENDPOINT_PREFIXES
        .iter()
        .any(|prefix| endpoint.id.starts_with(prefix))
        || endpoint.is_mcp()
}

fn validate_endpoint(endpoint: &Endpoint, index: usize, errors: &mut Vec<ValidationError>) {
    if endpoint.id.is_empty() {
        errors.push(error(
            ValidationCategory::EmptyId,
            format!("endpoint at index {} has an empty ID", index),
        ));
        return;
    }

    if endpoint.listener_id().is_none() {
        errors.push(error(
            ValidationCategory::MissingRequiredField,
            format!("endpoint '{}' has no listener ID", endpoint.id),
        ));
    }

    if endpoint.routes.is_empty() {
        if !is_routeless_exempt(endpoint) {
            errors.push(error(
                ValidationCategory::MissingRequiredField,
                format!("endpoint '{}' has no routes", endpoint.id),
            ));
        }
    } else {
        for (route_index, route) in endpoint.routes.iter().enumerate() {
            validate_route(route, route_index, endpoint, errors);
        }
    }

    validate_unique(
        &format!("middleware in endpoint '{}'", endpoint.id),
        endpoint.middlewares.iter().map(|m| m.id.as_str()),
        errors,
    );
    for (mw_index, middleware) in endpoint.middlewares.iter().enumerate() {
        validate_middleware(middleware, mw_index, &endpoint.id, errors);
    }
}

fn validate_route(
    route: &Route,
    index: usize,
    endpoint: &Endpoint,
    errors: &mut Vec<ValidationError>,
) {
    if route.app_id.is_empty() {
        errors.push(error(
            ValidationCategory::EmptyId,
            format!("route {} in endpoint '{}' has an empty app ID", index, endpoint.id),
        ));
    }

    // MCP endpoints dispatch by tool name, not by request shape.
    if route.matcher.is_none() && !endpoint.is_mcp() {
        errors.push(error(
            ValidationCategory::MissingRequiredField,
            format!("route {} in endpoint '{}' has no rule", index, endpoint.id),
        ));
    }
}

fn validate_middleware(
    middleware: &Middleware,
    index: usize,
    endpoint_id: &str,
    errors: &mut Vec<ValidationError>,
) {
    if middleware.id.is_empty() {
        errors.push(error(
            ValidationCategory::EmptyId,
            format!("middleware at index {} in endpoint '{}' has an empty ID", index, endpoint_id),
        ));
        return;
    }

    if middleware.kind == MiddlewareKind::Unspecified {
        errors.push(error(
            ValidationCategory::InvalidValue,
            format!(
                "middleware '{}' in endpoint '{}' has no supported type",
                middleware.id, endpoint_id
            ),
        ));
    }
}

fn validate_app(app: &AppDefinition, index: usize, errors: &mut Vec<ValidationError>) {
    if app.id.is_empty() {
        errors.push(error(
            ValidationCategory::EmptyId,
            format!("app at index {} has an empty ID", index),
        ));
        return;
    }

    let context = format!("app '{}'", app.id);
    match &app.kind {
        AppKind::Echo(_) => {}
        AppKind::Script(script) => validate_script(script, &context, errors),
        AppKind::CompositeScript(composite) => {
            if composite.script_app_ids.is_empty() {
                errors.push(error(
                    ValidationCategory::MissingRequiredField,
                    format!("{} has no script app IDs", context),
                ));
            }
            if composite.script_app_ids.iter().any(String::is_empty) {
                errors.push(error(
                    ValidationCategory::EmptyId,
                    format!("{} lists an empty script app ID", context),
                ));
            }
        }
        AppKind::Mcp(mcp) => {
            if mcp.server_name.is_empty() {
                errors.push(error(
                    ValidationCategory::MissingRequiredField,
                    format!("{} has an empty server name", context),
                ));
            }
            validate_unique(
                &format!("tool in {}", context),
                mcp.tools.iter().map(|t| t.name.as_str()),
                errors,
            );
            for (tool_index, tool) in mcp.tools.iter().enumerate() {
                let tool_context = if tool.name.is_empty() {
                    errors.push(error(
                        ValidationCategory::MissingRequiredField,
                        format!("tool at index {} in {} has an empty name", tool_index, context),
                    ));
                    format!("tool at index {} in {}", tool_index, context)
                } else {
                    format!("tool '{}' in {}", tool.name, context)
                };
                if let Some(script) = &tool.script {
                    validate_script(script, &tool_context, errors);
                }
            }
        }
        AppKind::Unspecified => errors.push(error(
            ValidationCategory::InvalidValue,
            format!("{} has no supported type", context),
        )),
    }
}

fn validate_script(script: &ScriptApp, context: &str, errors: &mut Vec<ValidationError>) {
    match &script.evaluator {
        None => errors.push(error(
            ValidationCategory::MissingRequiredField,
            format!("{} has no evaluator", context),
        )),
        Some(evaluator) if evaluator.source().is_none() => errors.push(error(
            ValidationCategory::MissingRequiredField,
            format!("{} {} evaluator has neither code nor uri", context, evaluator.key()),
        )),
        Some(_) => {}
    }
}
