//! Structural decode of a parsed tree by field-name correspondence.
//!
//! Skeleton types mirror the document layout but carry no variant
//! information: `type` tags, legacy shapes, and opaque payloads are left for
//! the post-processor, which reads them from the tree. Unknown fields are
//! dropped and every field defaults when absent.
//!
//! Sequences of entities decode leniently: an element that is not a table
//! becomes a default placeholder so the skeleton stays index-aligned with the
//! tree. A table whose fields have the wrong shape is a fatal
//! [`ConfigError::StructuralDecode`].

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::errors::ConfigError;
use crate::config::schema::{HeadersConfig, LogFields, McpTransport};
use crate::decode::parser::ParsedTree;

/// Decode the whole tree onto a [`ConfigSkeleton`].
pub fn decode_skeleton(tree: &ParsedTree) -> Result<ConfigSkeleton, ConfigError> {
    ConfigSkeleton::deserialize(tree.root())
        .map_err(|source| ConfigError::StructuralDecode { source })
}

/// Decode one standalone table, used for legacy shapes found by the post-processor.
pub(crate) fn decode_element<T: DeserializeOwned>(value: &Value) -> Result<T, ConfigError> {
    T::deserialize(value).map_err(|source| ConfigError::StructuralDecode { source })
}

fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let items = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if item.is_object() {
                T::deserialize(item)
                    .map_err(|e| de::Error::custom(format!("element at index {}: {}", index, e)))
            } else {
                Ok(T::default())
            }
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigSkeleton {
    pub logging: Option<LoggingSkeleton>,
    #[serde(deserialize_with = "lenient_seq")]
    pub listeners: Vec<ListenerSkeleton>,
    #[serde(deserialize_with = "lenient_seq")]
    pub endpoints: Vec<EndpointSkeleton>,
    #[serde(deserialize_with = "lenient_seq")]
    pub apps: Vec<AppSkeleton>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSkeleton {
    pub format: Option<String>,
    pub level: Option<String>,
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListenerSkeleton {
    pub id: String,
    pub address: String,
    pub http: HttpOptionsSkeleton,
    pub grpc: GrpcOptionsSkeleton,
}

/// Durations stay strings until the post-processor reads them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HttpOptionsSkeleton {
    pub read_timeout: Option<String>,
    pub write_timeout: Option<String>,
    pub drain_timeout: Option<String>,
    pub idle_timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GrpcOptionsSkeleton {
    pub max_connection_idle: Option<String>,
    pub max_connection_age: Option<String>,
    pub max_concurrent_streams: Option<u32>,
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EndpointSkeleton {
    pub id: String,
    pub listener_ids: Vec<String>,
    #[serde(deserialize_with = "lenient_seq")]
    pub routes: Vec<RouteSkeleton>,
    #[serde(deserialize_with = "lenient_seq")]
    pub middlewares: Vec<MiddlewareSkeleton>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RouteSkeleton {
    pub app_id: String,
    pub http: Option<HttpRuleSkeleton>,
    pub grpc: Option<GrpcRuleSkeleton>,
    /// Flat legacy form of `http.path_prefix`.
    pub http_path: Option<String>,
    /// Flat legacy form of `grpc.service`.
    pub grpc_service: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HttpRuleSkeleton {
    pub path_prefix: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GrpcRuleSkeleton {
    pub service: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MiddlewareSkeleton {
    pub id: String,
    pub console_logger: ConsoleLoggerSkeleton,
    pub headers: HeadersConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConsoleLoggerSkeleton {
    pub preset: Option<String>,
    pub options: LoggingSkeleton,
    pub fields: LogFields,
    pub output: Option<String>,
    pub include_only_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub include_only_methods: Vec<String>,
    pub exclude_methods: Vec<String>,
}

// ---------------------------------------------------------------------------
// Apps
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppSkeleton {
    pub id: String,
    pub echo: EchoSkeleton,
    pub script: ScriptSkeleton,
    pub composite_script: CompositeScriptSkeleton,
    pub mcp: McpSkeleton,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EchoSkeleton {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScriptSkeleton {
    pub risor: Option<EvaluatorSkeleton>,
    pub starlark: Option<EvaluatorSkeleton>,
    pub extism: Option<EvaluatorSkeleton>,
}

impl ScriptSkeleton {
    pub fn evaluator(&self, key: &str) -> Option<&EvaluatorSkeleton> {
        match key {
            "risor" => self.risor.as_ref(),
            "starlark" => self.starlark.as_ref(),
            "extism" => self.extism.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EvaluatorSkeleton {
    pub code: Option<String>,
    pub uri: Option<String>,
    pub timeout: Option<String>,
    pub entrypoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompositeScriptSkeleton {
    pub script_app_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct McpSkeleton {
    pub server_name: String,
    pub server_version: String,
    pub transport: Option<McpTransport>,
    #[serde(deserialize_with = "lenient_seq")]
    pub tools: Vec<McpToolSkeleton>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct McpToolSkeleton {
    pub name: String,
    pub description: String,
    pub input_schema: String,
    pub script: Option<ScriptSkeleton>,
}
