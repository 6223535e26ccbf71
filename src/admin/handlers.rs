use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::AdminState;
use crate::observability::metrics;
use crate::service::{GetConfigResponse, ServiceError, UpdateConfigRequest};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub config_version: String,
    pub listeners: usize,
    pub endpoints: usize,
    pub apps: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A JSON error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match err {
            ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    metrics::record_api_request("status");
    let config = state.service.store().snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        config_version: config.version.clone(),
        listeners: config.listeners.len(),
        endpoints: config.endpoints.len(),
        apps: config.apps.len(),
    })
}

pub async fn get_config(State(state): State<AdminState>) -> Json<GetConfigResponse> {
    metrics::record_api_request("get_config");
    Json(state.service.get_config())
}

pub async fn update_config(
    State(state): State<AdminState>,
    payload: Result<Json<UpdateConfigRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    metrics::record_api_request("update_config");
    let Json(request) = payload
        .map_err(|rejection| ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text()))?;

    // Decode and validation are CPU-bound; keep them off the async workers.
    let service = state.service.clone();
    let response = tokio::task::spawn_blocking(move || service.update_config(request))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))??;

    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(response)).into_response())
}
