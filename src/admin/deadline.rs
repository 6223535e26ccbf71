//! Caller-supplied deadlines.
//!
//! A request may carry `x-request-deadline-ms: <millis>`. The handler is
//! abandoned with 504 once it elapses. Decode work already handed to the
//! blocking pool is not interrupted and may still be applied.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::handlers::ApiError;

pub const X_REQUEST_DEADLINE_MS: &str = "x-request-deadline-ms";

pub async fn deadline_middleware(request: Request<Body>, next: Next) -> Response {
    let deadline = match request.headers().get(X_REQUEST_DEADLINE_MS) {
        None => return next.run(request).await,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis),
    };

    let Some(deadline) = deadline else {
        return ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("{} must be a whole number of milliseconds", X_REQUEST_DEADLINE_MS),
        )
        .into_response();
    };

    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                deadline_ms = deadline.as_millis() as u64,
                "Control API request exceeded caller deadline"
            );
            ApiError::new(StatusCode::GATEWAY_TIMEOUT, "deadline exceeded").into_response()
        }
    }
}
