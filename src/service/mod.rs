//! Control-plane service: read and replace the active configuration.
//!
//! Transport-agnostic. The `admin` module exposes it over HTTP/JSON and the
//! file watcher drives the store directly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::schema::CanonicalConfig;
use crate::decode::parser::{DocumentFormat, RawDocument};
use crate::store::ConfigStore;

/// A configuration document carried inside a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub format: DocumentFormat,
    pub content: String,
}

impl DocumentPayload {
    pub fn new(format: DocumentFormat, content: impl Into<String>) -> Self {
        Self {
            format,
            content: content.into(),
        }
    }
}

impl From<DocumentPayload> for RawDocument {
    fn from(payload: DocumentPayload) -> Self {
        RawDocument::new(payload.format, payload.content.into_bytes())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateConfigRequest {
    /// The candidate document. Absent is an invalid argument.
    #[serde(default)]
    pub config: Option<DocumentPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetConfigResponse {
    pub config: CanonicalConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateConfigResponse {
    pub success: bool,
    /// Every problem joined into one message, on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One message per problem, on rejection.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// The active configuration after the call.
    pub config: CanonicalConfig,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone)]
pub struct ConfigService {
    store: Arc<ConfigStore>,
}

impl ConfigService {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn get_config(&self) -> GetConfigResponse {
        GetConfigResponse {
            config: self.store.get(),
        }
    }

    /// Validate and activate a candidate document.
    ///
    /// A rejected document is not an error here: the response reports
    /// `success = false` with every problem and the unchanged active config.
    pub fn update_config(
        &self,
        request: UpdateConfigRequest,
    ) -> Result<UpdateConfigResponse, ServiceError> {
        let payload = request
            .config
            .ok_or_else(|| ServiceError::InvalidArgument("config is required".to_string()))?;

        match self.store.update(&RawDocument::from(payload)) {
            Ok(config) => Ok(UpdateConfigResponse {
                success: true,
                error: None,
                errors: Vec::new(),
                config,
            }),
            Err(errors) => Ok(UpdateConfigResponse {
                success: false,
                error: Some(errors.to_string()),
                errors: errors.messages(),
                config: self.store.get(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ConfigService {
        ConfigService::new(Arc::new(ConfigStore::empty()))
    }

    fn payload(content: &str) -> UpdateConfigRequest {
        UpdateConfigRequest {
            config: Some(DocumentPayload::new(DocumentFormat::Toml, content)),
        }
    }

    #[test]
    fn test_missing_config_is_invalid_argument() {
        let service = service();
        let before = service.get_config().config;

        let err = service.update_config(UpdateConfigRequest::default()).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
        assert_eq!(service.get_config().config, before);
    }

    #[test]
    fn test_successful_update() {
        let service = service();
        let response = service
            .update_config(payload(
                "[[listeners]]\nid = \"l1\"\naddress = \":80\"\ntype = \"http\"\n",
            ))
            .unwrap();

        assert!(response.success);
        assert!(response.error.is_none());
        assert_eq!(response.config.listeners[0].id, "l1");
        assert_eq!(service.get_config().config, response.config);
    }

    #[test]
    fn test_rejected_update_reports_every_problem() {
        let service = service();
        let response = service
            .update_config(payload(concat!(
                "[[listeners]]\nid = \"l1\"\ntype = \"http\"\n\n",
                "[[apps]]\nid = \"\"\ntype = \"echo\"\n",
            )))
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.errors.len(), 2);
        let error = response.error.unwrap();
        assert!(error.contains("empty address"));
        assert!(error.contains("app at index 0 has an empty ID"));
        assert_eq!(response.config, CanonicalConfig::default());
    }
}
