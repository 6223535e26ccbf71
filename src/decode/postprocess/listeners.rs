use std::time::Duration;

use serde_json::Value;

use super::{discriminator, entity_context};
use crate::config::duration::parse_duration;
use crate::config::errors::{ConfigError, ErrorList, VariantFamily};
use crate::config::schema::{
    GrpcListenerOptions, HttpListenerOptions, Listener, ListenerKind,
    DEFAULT_GRPC_MAX_CONNECTION_AGE, DEFAULT_GRPC_MAX_CONNECTION_IDLE,
    DEFAULT_HTTP_DRAIN_TIMEOUT, DEFAULT_HTTP_IDLE_TIMEOUT, DEFAULT_HTTP_READ_TIMEOUT,
    DEFAULT_HTTP_WRITE_TIMEOUT,
};
use crate::decode::skeleton::{GrpcOptionsSkeleton, HttpOptionsSkeleton, ListenerSkeleton};

pub(super) fn process_listeners(
    nodes: &[Value],
    skeletons: Vec<ListenerSkeleton>,
    errors: &mut ErrorList,
) -> Vec<Listener> {
    let mut listeners = Vec::with_capacity(skeletons.len());

    for (index, (node, skel)) in nodes.iter().zip(skeletons).enumerate() {
        let Some(node) = node.as_object() else {
            errors.push(ConfigError::malformed("listener", index));
            continue;
        };

        let context = entity_context("listener", index, &skel.id);
        let kind = match discriminator(node, "type").as_deref() {
            Some("http") => ListenerKind::Http(http_options(&skel.http, &context, errors)),
            Some("grpc") => ListenerKind::Grpc(grpc_options(&skel.grpc, &context, errors)),
            Some(other) => {
                errors.push(ConfigError::unsupported(&context, VariantFamily::ListenerType, other));
                ListenerKind::Unspecified
            }
            None => ListenerKind::Unspecified,
        };

        listeners.push(Listener {
            id: skel.id,
            address: skel.address,
            kind,
        });
    }

    listeners
}

fn http_options(
    skel: &HttpOptionsSkeleton,
    context: &str,
    errors: &mut ErrorList,
) -> HttpListenerOptions {
    HttpListenerOptions {
        read_timeout: duration_field(
            skel.read_timeout.as_deref(),
            DEFAULT_HTTP_READ_TIMEOUT,
            context,
            "read_timeout",
            errors,
        ),
        write_timeout: duration_field(
            skel.write_timeout.as_deref(),
            DEFAULT_HTTP_WRITE_TIMEOUT,
            context,
            "write_timeout",
            errors,
        ),
        drain_timeout: duration_field(
            skel.drain_timeout.as_deref(),
            DEFAULT_HTTP_DRAIN_TIMEOUT,
            context,
            "drain_timeout",
            errors,
        ),
        idle_timeout: duration_field(
            skel.idle_timeout.as_deref(),
            DEFAULT_HTTP_IDLE_TIMEOUT,
            context,
            "idle_timeout",
            errors,
        ),
    }
}

fn grpc_options(
    skel: &GrpcOptionsSkeleton,
    context: &str,
    errors: &mut ErrorList,
) -> GrpcListenerOptions {
    GrpcListenerOptions {
        max_connection_idle: duration_field(
            skel.max_connection_idle.as_deref(),
            DEFAULT_GRPC_MAX_CONNECTION_IDLE,
            context,
            "max_connection_idle",
            errors,
        ),
        max_connection_age: duration_field(
            skel.max_connection_age.as_deref(),
            DEFAULT_GRPC_MAX_CONNECTION_AGE,
            context,
            "max_connection_age",
            errors,
        ),
        max_concurrent_streams: skel.max_concurrent_streams.unwrap_or(0),
    }
}

/// Parse an optional duration string, keeping `default` when absent or invalid.
pub(super) fn duration_field(
    value: Option<&str>,
    default: Duration,
    context: &str,
    field: &'static str,
    errors: &mut ErrorList,
) -> Duration {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return default;
    };
    match parse_duration(value) {
        Ok(duration) => duration,
        Err(e) => {
            errors.push(ConfigError::InvalidField {
                context: context.to_string(),
                field,
                value: value.to_string(),
                reason: e.to_string(),
            });
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::errors::ErrorKind;
    use serde_json::json;

    fn skel(id: &str) -> ListenerSkeleton {
        ListenerSkeleton {
            id: id.into(),
            address: ":8080".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_http_defaults_and_overrides() {
        let mut errors = ErrorList::new();
        let mut s = skel("public");
        s.http.read_timeout = Some("2s".into());

        let listeners = process_listeners(&[json!({"type": "http"})], vec![s], &mut errors);

        assert!(errors.is_empty());
        let ListenerKind::Http(options) = &listeners[0].kind else {
            panic!("expected http listener");
        };
        assert_eq!(options.read_timeout, Duration::from_secs(2));
        assert_eq!(options.idle_timeout, DEFAULT_HTTP_IDLE_TIMEOUT);
    }

    #[test]
    fn test_grpc_listener() {
        let mut errors = ErrorList::new();
        let mut s = skel("rpc");
        s.grpc.max_concurrent_streams = Some(64);

        let listeners = process_listeners(&[json!({"type": "grpc"})], vec![s], &mut errors);
        let ListenerKind::Grpc(options) = &listeners[0].kind else {
            panic!("expected grpc listener");
        };
        assert_eq!(options.max_concurrent_streams, 64);
        assert_eq!(options.max_connection_age, DEFAULT_GRPC_MAX_CONNECTION_AGE);
    }

    #[test]
    fn test_bad_duration_keeps_default() {
        let mut errors = ErrorList::new();
        let mut s = skel("public");
        s.http.write_timeout = Some("soon".into());

        let listeners = process_listeners(&[json!({"type": "http"})], vec![s], &mut errors);

        assert!(errors.has(ErrorKind::InvalidField));
        assert!(errors.to_string().contains("listener 'public': invalid write_timeout 'soon'"));
        let ListenerKind::Http(options) = &listeners[0].kind else {
            panic!("expected http listener");
        };
        assert_eq!(options.write_timeout, DEFAULT_HTTP_WRITE_TIMEOUT);
    }

    #[test]
    fn test_only_overlapping_prefix_is_processed() {
        let mut errors = ErrorList::new();
        let nodes = [json!({"type": "http"}), json!({"type": "http"})];

        let listeners = process_listeners(&nodes, vec![skel("only")], &mut errors);
        assert_eq!(listeners.len(), 1);
        assert!(errors.is_empty());
    }
}
