//! Endpoints, their routes, and the legacy endpoint shapes.
//!
//! Legacy shapes accepted here:
//! - `listener_id = "x"` instead of `listener_ids = ["x"]`
//! - a singular `[endpoints.route]` table instead of `[[endpoints.routes]]`
//! - flat `http_path` / `grpc_service` keys instead of matcher sub-tables

use serde_json::{Map, Value};

use super::{array, entity_context, middlewares, static_data};
use crate::config::errors::{ConfigError, ErrorList, VariantFamily};
use crate::config::schema::{Endpoint, Route, RouteMatcher};
use crate::decode::skeleton::{decode_element, EndpointSkeleton, RouteSkeleton};

pub(super) fn process_endpoints(
    nodes: &[Value],
    skeletons: Vec<EndpointSkeleton>,
    errors: &mut ErrorList,
) -> Vec<Endpoint> {
    let mut endpoints = Vec::with_capacity(skeletons.len());

    for (index, (node, skel)) in nodes.iter().zip(skeletons).enumerate() {
        let Some(node) = node.as_object() else {
            errors.push(ConfigError::malformed("endpoint", index));
            continue;
        };

        let context = entity_context("endpoint", index, &skel.id);
        let listener_ids = listener_refs(node, skel.listener_ids);

        let mut routes = process_routes(array(Some(node), "routes"), skel.routes, &context, errors);
        if let Some(legacy) = node.get("route") {
            if routes.is_empty() {
                routes.extend(legacy_route(node, legacy, &context, errors));
            } else {
                tracing::warn!(
                    endpoint = %context,
                    "Ignoring singular 'route' because 'routes' is set"
                );
            }
        }

        let middlewares = middlewares::process_middlewares(
            array(Some(node), "middlewares"),
            skel.middlewares,
            &context,
            errors,
        );

        endpoints.push(Endpoint {
            id: skel.id,
            listener_ids,
            routes,
            middlewares,
        });
    }

    endpoints
}

/// Listener references, accepting the legacy singular string.
fn listener_refs(node: &Map<String, Value>, listener_ids: Vec<String>) -> Vec<String> {
    if !listener_ids.is_empty() {
        return listener_ids;
    }
    match node.get("listener_id") {
        Some(Value::String(id)) if !id.is_empty() => vec![id.clone()],
        _ => Vec::new(),
    }
}

fn process_routes(
    nodes: &[Value],
    skeletons: Vec<RouteSkeleton>,
    endpoint: &str,
    errors: &mut ErrorList,
) -> Vec<Route> {
    let mut routes = Vec::with_capacity(skeletons.len());
    for (index, (node, skel)) in nodes.iter().zip(skeletons).enumerate() {
        let Some(node) = node.as_object() else {
            errors.push(ConfigError::malformed(format!("route in {}", endpoint), index));
            continue;
        };
        routes.push(build_route(node, skel, &format!("route {} in {}", index, endpoint), errors));
    }
    routes
}

/// Convert a singular `route` table into a one-element route list.
///
/// The route's `app_id` falls back to one set directly on the endpoint.
fn legacy_route(
    endpoint_node: &Map<String, Value>,
    legacy: &Value,
    endpoint: &str,
    errors: &mut ErrorList,
) -> Option<Route> {
    let Some(node) = legacy.as_object() else {
        errors.push(ConfigError::InvalidField {
            context: endpoint.to_string(),
            field: "route",
            value: legacy.to_string(),
            reason: "expected a table".to_string(),
        });
        return None;
    };

    let mut skel: RouteSkeleton = match decode_element(legacy) {
        Ok(skel) => skel,
        Err(e) => {
            errors.push(e);
            return None;
        }
    };
    if skel.app_id.is_empty() {
        if let Some(Value::String(app_id)) = endpoint_node.get("app_id") {
            skel.app_id = app_id.clone();
        }
    }

    Some(build_route(node, skel, &format!("route 0 in {}", endpoint), errors))
}

fn build_route(
    node: &Map<String, Value>,
    skel: RouteSkeleton,
    context: &str,
    errors: &mut ErrorList,
) -> Route {
    let matcher = resolve_matcher(&skel, context, errors);
    Route {
        app_id: skel.app_id,
        matcher,
        static_data: static_data(Some(node), context, errors),
    }
}

fn resolve_matcher(
    skel: &RouteSkeleton,
    context: &str,
    errors: &mut ErrorList,
) -> Option<RouteMatcher> {
    let http = skel
        .http
        .as_ref()
        .map(|rule| rule.path_prefix.clone())
        .or_else(|| skel.http_path.clone());
    let grpc = skel
        .grpc
        .as_ref()
        .map(|rule| rule.service.clone())
        .or_else(|| skel.grpc_service.clone());

    match (http, grpc) {
        (Some(prefix), Some(_)) => {
            errors.push(ConfigError::AmbiguousVariant {
                context: context.to_string(),
                family: VariantFamily::RouteMatcher,
                choices: vec!["http".to_string(), "grpc".to_string()],
            });
            Some(RouteMatcher::HttpPathPrefix(prefix))
        }
        (Some(prefix), None) => Some(RouteMatcher::HttpPathPrefix(prefix)),
        (None, Some(service)) => Some(RouteMatcher::GrpcService(service)),
        (None, None) => None,
    }
}
