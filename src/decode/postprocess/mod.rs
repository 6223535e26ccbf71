//! Semantic post-processing of a decoded skeleton.
//!
//! Walks the parsed tree's arrays in lock-step with the skeleton's arrays and
//! builds the canonical model, one collection per submodule.
//!
//! # Design Decisions
//! - Only the overlapping prefix of tree and skeleton arrays is visited
//! - A non-table element is reported as malformed and skipped
//! - An unrecognized discriminator is reported and leaves the arm unspecified
//! - Every problem is collected; nothing here stops at the first error

mod apps;
mod endpoints;
mod listeners;
mod logging;
mod middlewares;

use serde_json::{Map, Value};

use crate::config::errors::{ConfigError, ErrorList};
use crate::config::schema::{CanonicalConfig, StaticData};
use crate::decode::parser::ParsedTree;
use crate::decode::skeleton::ConfigSkeleton;

/// Build a canonical candidate plus every problem found while doing so.
pub fn post_process(
    tree: &ParsedTree,
    skeleton: ConfigSkeleton,
    version: String,
) -> (CanonicalConfig, ErrorList) {
    let mut errors = ErrorList::new();

    let logging = skeleton
        .logging
        .map(|skel| logging::process_logging(skel, &mut errors));
    let listeners =
        listeners::process_listeners(tree.array("listeners"), skeleton.listeners, &mut errors);
    let endpoints =
        endpoints::process_endpoints(tree.array("endpoints"), skeleton.endpoints, &mut errors);
    let apps = apps::process_apps(tree.array("apps"), skeleton.apps, &mut errors);

    let config = CanonicalConfig {
        version,
        logging,
        listeners,
        endpoints,
        apps,
    };
    (config, errors)
}

/// `"<kind> '<id>'"`, or `"<kind> at index <n>"` when the ID is empty.
pub(crate) fn entity_context(kind: &str, index: usize, id: &str) -> String {
    if id.is_empty() {
        format!("{} at index {}", kind, index)
    } else {
        format!("{} '{}'", kind, id)
    }
}

/// Read a discriminator. Non-string values are rendered so they can be reported.
fn discriminator(node: &Map<String, Value>, key: &str) -> Option<String> {
    match node.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn table<'a>(node: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    node.get(key).and_then(Value::as_object)
}

fn array<'a>(node: Option<&'a Map<String, Value>>, key: &str) -> &'a [Value] {
    match node.and_then(|n| n.get(key)) {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

/// Copy a `static_data` table verbatim.
fn static_data(
    node: Option<&Map<String, Value>>,
    context: &str,
    errors: &mut ErrorList,
) -> StaticData {
    match node.and_then(|n| n.get("static_data")) {
        None | Some(Value::Null) => StaticData::new(),
        Some(Value::Object(map)) => StaticData::from(map.clone()),
        Some(other) => {
            errors.push(ConfigError::InvalidField {
                context: context.to_string(),
                field: "static_data",
                value: other.to_string(),
                reason: "expected a table".to_string(),
            });
            StaticData::new()
        }
    }
}
