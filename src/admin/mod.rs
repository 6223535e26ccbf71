//! Control API: the config service over HTTP/JSON.
//!
//! ```text
//! GET  /v1/status  → uptime and entity counts (no auth)
//! GET  /v1/config  → GetConfigResponse
//! POST /v1/config  → UpdateConfigResponse (200 accepted, 422 rejected, 400 bad request)
//! ```
//!
//! Every route gets a request ID, a server-wide timeout, and a body limit.
//! Config routes additionally honor `x-request-deadline-ms` and bearer auth.

pub mod auth;
pub mod deadline;
pub mod handlers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use self::auth::admin_auth_middleware;
use self::deadline::deadline_middleware;
use self::handlers::*;
use crate::service::ConfigService;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Settings for the control API transport.
#[derive(Debug, Clone)]
pub struct AdminOptions {
    /// Required bearer token; `None` disables auth.
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for AdminOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// State injected into control API handlers.
#[derive(Clone)]
pub struct AdminState {
    pub service: ConfigService,
    pub api_key: Option<Arc<str>>,
    pub started_at: Instant,
}

/// UUID v4 request IDs for `x-request-id`.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

#[allow(deprecated)]
pub fn setup_admin_router(service: ConfigService, options: AdminOptions) -> Router {
    let state = AdminState {
        service,
        api_key: options.api_key.map(Arc::from),
        started_at: Instant::now(),
    };

    let config_routes = Router::new()
        .route("/v1/config", get(get_config).post(update_config))
        .layer(middleware::from_fn(deadline_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .route("/v1/status", get(get_status))
        .merge(config_routes)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(options.max_body_bytes))
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
}
