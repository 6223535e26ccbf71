//! Canonical configuration definitions.
//!
//! This module defines the validated, strongly-typed configuration tree.
//! Every oneof in the document (listener type, middleware type, app type,
//! evaluator, route matcher) is an explicit enum here; the decode pipeline is
//! the only place that turns string tags into these arms.
//!
//! Types implement `Serialize` in *document shape*: a listener serializes as
//! `type = "http"` plus its `[http]` block, an evaluator as `code` or `uri`
//! under its `risor`/`starlark`/`extism` key. Rendering a config with
//! [`CanonicalConfig::to_document`] and decoding it again yields an equal value.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::duration::serde_duration;
use crate::decode::parser::{DocumentFormat, RawDocument};

/// The only document version this build understands.
pub const SUPPORTED_VERSION: &str = "v1";

/// Listener reference used by MCP-style endpoints, whose routes need no matcher.
pub const MCP_LISTENER_ID: &str = "mcp_listener";

/// Root of the canonical configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalConfig {
    /// Schema version, always [`SUPPORTED_VERSION`] once decoded.
    pub version: String,

    /// Process log options, when the document has a `[logging]` table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingOptions>,

    /// Network listeners, in document order.
    pub listeners: Vec<Listener>,

    /// Routing endpoints, in document order.
    pub endpoints: Vec<Endpoint>,

    /// Application definitions, in document order.
    pub apps: Vec<AppDefinition>,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION.to_string(),
            logging: None,
            listeners: Vec::new(),
            endpoints: Vec::new(),
            apps: Vec::new(),
        }
    }
}

/// Failure to render a canonical config back into a document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to render TOML: {0}")]
    Toml(#[from] toml::ser::Error),
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CanonicalConfig {
    pub fn listener(&self, id: &str) -> Option<&Listener> {
        self.listeners.iter().find(|l| l.id == id)
    }

    pub fn endpoint(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id == id)
    }

    pub fn app(&self, id: &str) -> Option<&AppDefinition> {
        self.apps.iter().find(|a| a.id == id)
    }

    /// References that name no defined listener or app.
    ///
    /// The validator does not reject these; callers decide what to do.
    pub fn dangling_references(&self) -> Vec<String> {
        let listener_ids: HashSet<&str> = self.listeners.iter().map(|l| l.id.as_str()).collect();
        let app_ids: HashSet<&str> = self.apps.iter().map(|a| a.id.as_str()).collect();

        let mut dangling = Vec::new();
        for endpoint in &self.endpoints {
            for listener_id in &endpoint.listener_ids {
                if !listener_id.is_empty()
                    && listener_id != MCP_LISTENER_ID
                    && !listener_ids.contains(listener_id.as_str())
                {
                    dangling.push(format!(
                        "endpoint '{}' references unknown listener '{}'",
                        endpoint.id, listener_id
                    ));
                }
            }
            for (index, route) in endpoint.routes.iter().enumerate() {
                if !route.app_id.is_empty() && !app_ids.contains(route.app_id.as_str()) {
                    dangling.push(format!(
                        "route {} in endpoint '{}' references unknown app '{}'",
                        index, endpoint.id, route.app_id
                    ));
                }
            }
        }
        dangling
    }

    /// Render this configuration as a document the pipeline can decode again.
    pub fn to_document(&self, format: DocumentFormat) -> Result<RawDocument, RenderError> {
        let content = match format {
            DocumentFormat::Toml => toml::to_string(self)?.into_bytes(),
            DocumentFormat::Json => serde_json::to_vec_pretty(self)?,
        };
        Ok(RawDocument::new(format, content))
    }
}

/// Process-wide log options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoggingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<LogFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Txt,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogFormat {
    /// Accepts `json`, `txt` and `text`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(LogFormat::Json),
            "txt" | "text" => Some(LogFormat::Txt),
            _ => None,
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unsupported log format: {}", s))
    }
}

impl LogLevel {
    /// Accepts `debug`, `info`, `warn`/`warning`, `error` and `fatal`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "fatal" => Some(LogLevel::Fatal),
            _ => None,
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error | LogLevel::Fatal => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unsupported log level: {}", s))
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A network listener.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listener {
    /// Unique listener identifier.
    pub id: String,

    /// Bind address (e.g., ":8080" or "127.0.0.1:8080").
    pub address: String,

    /// Protocol and its options.
    #[serde(flatten)]
    pub kind: ListenerKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ListenerKind {
    Http(HttpListenerOptions),
    Grpc(GrpcListenerOptions),
    #[default]
    Unspecified,
}

impl ListenerKind {
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            ListenerKind::Http(_) => Some("http"),
            ListenerKind::Grpc(_) => Some("grpc"),
            ListenerKind::Unspecified => None,
        }
    }
}

impl Serialize for ListenerKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            ListenerKind::Http(options) => {
                map.serialize_entry("type", "http")?;
                map.serialize_entry("http", options)?;
            }
            ListenerKind::Grpc(options) => {
                map.serialize_entry("type", "grpc")?;
                map.serialize_entry("grpc", options)?;
            }
            ListenerKind::Unspecified => {}
        }
        map.end()
    }
}

pub const DEFAULT_HTTP_READ_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_HTTP_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_HTTP_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_HTTP_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP listener options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpListenerOptions {
    #[serde(serialize_with = "serde_duration::serialize")]
    pub read_timeout: Duration,
    #[serde(serialize_with = "serde_duration::serialize")]
    pub write_timeout: Duration,
    /// Time allowed for in-flight requests to finish on shutdown.
    #[serde(serialize_with = "serde_duration::serialize")]
    pub drain_timeout: Duration,
    #[serde(serialize_with = "serde_duration::serialize")]
    pub idle_timeout: Duration,
}

impl Default for HttpListenerOptions {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_HTTP_READ_TIMEOUT,
            write_timeout: DEFAULT_HTTP_WRITE_TIMEOUT,
            drain_timeout: DEFAULT_HTTP_DRAIN_TIMEOUT,
            idle_timeout: DEFAULT_HTTP_IDLE_TIMEOUT,
        }
    }
}

pub const DEFAULT_GRPC_MAX_CONNECTION_IDLE: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_GRPC_MAX_CONNECTION_AGE: Duration = Duration::from_secs(30 * 60);

/// gRPC listener options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrpcListenerOptions {
    #[serde(serialize_with = "serde_duration::serialize")]
    pub max_connection_idle: Duration,
    #[serde(serialize_with = "serde_duration::serialize")]
    pub max_connection_age: Duration,
    /// Zero means unlimited.
    pub max_concurrent_streams: u32,
}

impl Default for GrpcListenerOptions {
    fn default() -> Self {
        Self {
            max_connection_idle: DEFAULT_GRPC_MAX_CONNECTION_IDLE,
            max_connection_age: DEFAULT_GRPC_MAX_CONNECTION_AGE,
            max_concurrent_streams: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoints and routes
// ---------------------------------------------------------------------------

/// Binds a set of routes and middlewares to listeners.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Endpoint {
    /// Unique endpoint identifier.
    pub id: String,

    /// Listeners this endpoint is served on.
    pub listener_ids: Vec<String>,

    /// Routes, checked in order; first match wins.
    pub routes: Vec<Route>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub middlewares: Vec<Middleware>,
}

impl Endpoint {
    /// The primary listener reference, if a non-empty one is set.
    pub fn listener_id(&self) -> Option<&str> {
        self.listener_ids
            .first()
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Whether this endpoint is bound to the reserved MCP listener.
    pub fn is_mcp(&self) -> bool {
        self.listener_ids.iter().any(|id| id == MCP_LISTENER_ID)
    }
}

/// Maps a request condition to an application.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Route {
    pub app_id: String,

    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<RouteMatcher>,

    #[serde(skip_serializing_if = "StaticData::is_empty")]
    pub static_data: StaticData,
}

/// Condition a request must satisfy for a route to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatcher {
    /// Literal path prefix.
    HttpPathPrefix(String),
    /// Fully-qualified gRPC service name.
    GrpcService(String),
}

impl Serialize for RouteMatcher {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            RouteMatcher::HttpPathPrefix(prefix) => {
                let mut rule = BTreeMap::new();
                rule.insert("path_prefix", prefix);
                map.serialize_entry("http", &rule)?;
            }
            RouteMatcher::GrpcService(service) => {
                let mut rule = BTreeMap::new();
                rule.insert("service", service);
                map.serialize_entry("grpc", &rule)?;
            }
        }
        map.end()
    }
}

/// Opaque key/value bag copied verbatim from the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StaticData(Map<String, Value>);

impl StaticData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for StaticData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// Middlewares
// ---------------------------------------------------------------------------

/// Per-endpoint request/response middleware.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Middleware {
    pub id: String,
    #[serde(flatten)]
    pub kind: MiddlewareKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum MiddlewareKind {
    ConsoleLogger(ConsoleLoggerConfig),
    Headers(HeadersConfig),
    #[default]
    Unspecified,
}

impl MiddlewareKind {
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            MiddlewareKind::ConsoleLogger(_) => Some("console_logger"),
            MiddlewareKind::Headers(_) => Some("headers"),
            MiddlewareKind::Unspecified => None,
        }
    }
}

impl Serialize for MiddlewareKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            MiddlewareKind::ConsoleLogger(config) => {
                map.serialize_entry("type", "console_logger")?;
                map.serialize_entry("console_logger", config)?;
            }
            MiddlewareKind::Headers(config) => {
                map.serialize_entry("type", "headers")?;
                map.serialize_entry("headers", config)?;
            }
            MiddlewareKind::Unspecified => {}
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogPreset {
    Minimal,
    Standard,
    Detailed,
    Debug,
}

impl LogPreset {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "minimal" => Some(LogPreset::Minimal),
            "standard" => Some(LogPreset::Standard),
            "detailed" => Some(LogPreset::Detailed),
            "debug" => Some(LogPreset::Debug),
            _ => None,
        }
    }
}

/// Console request logger.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsoleLoggerConfig {
    /// Applied before the explicit `fields` overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<LogPreset>,

    pub options: ConsoleLogOptions,

    pub fields: LogFields,

    /// Output destination; stdout when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Path prefixes to log exclusively.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_only_paths: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_paths: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_only_methods: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_methods: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsoleLogOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<LogFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
}

/// Which request attributes the console logger emits. `None` defers to the preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<DirectionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<DirectionConfig>,
}

/// Request- or response-side logging detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_size: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_body_size: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_headers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_headers: Vec<String>,
}

/// Header rewriting middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadersConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<HeaderOperations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<HeaderOperations>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderOperations {
    /// Replace existing values.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub set_headers: BTreeMap<String, String>,
    /// Append to existing values.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub add_headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_headers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

/// An application routes can dispatch to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppDefinition {
    pub id: String,
    #[serde(flatten)]
    pub kind: AppKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AppKind {
    Echo(EchoApp),
    Script(ScriptApp),
    CompositeScript(CompositeScriptApp),
    Mcp(McpApp),
    #[default]
    Unspecified,
}

impl AppKind {
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            AppKind::Echo(_) => Some("echo"),
            AppKind::Script(_) => Some("script"),
            AppKind::CompositeScript(_) => Some("composite_script"),
            AppKind::Mcp(_) => Some("mcp"),
            AppKind::Unspecified => None,
        }
    }
}

impl Serialize for AppKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            AppKind::Echo(app) => {
                map.serialize_entry("type", "echo")?;
                map.serialize_entry("echo", app)?;
            }
            AppKind::Script(app) => {
                map.serialize_entry("type", "script")?;
                map.serialize_entry("script", app)?;
            }
            AppKind::CompositeScript(app) => {
                map.serialize_entry("type", "composite_script")?;
                map.serialize_entry("composite_script", app)?;
            }
            AppKind::Mcp(app) => {
                map.serialize_entry("type", "mcp")?;
                map.serialize_entry("mcp", app)?;
            }
            AppKind::Unspecified => {}
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EchoApp {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub response: String,
}

/// A script run by one evaluator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptApp {
    pub evaluator: Option<Evaluator>,
    pub static_data: StaticData,
}

impl Serialize for ScriptApp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.static_data.is_empty() {
            map.serialize_entry("static_data", &self.static_data)?;
        }
        match &self.evaluator {
            Some(Evaluator::Risor(eval)) => map.serialize_entry("risor", eval)?,
            Some(Evaluator::Starlark(eval)) => map.serialize_entry("starlark", eval)?,
            Some(Evaluator::Extism(eval)) => map.serialize_entry("extism", eval)?,
            None => {}
        }
        map.end()
    }
}

/// Where an evaluator's program comes from. Inline code wins over a URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Code(String),
    Uri(String),
}

pub const DEFAULT_EVALUATOR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluator {
    Risor(RisorEvaluator),
    Starlark(StarlarkEvaluator),
    Extism(ExtismEvaluator),
}

impl Evaluator {
    /// Document key naming this evaluator.
    pub fn key(&self) -> &'static str {
        match self {
            Evaluator::Risor(_) => "risor",
            Evaluator::Starlark(_) => "starlark",
            Evaluator::Extism(_) => "extism",
        }
    }

    pub fn source(&self) -> Option<&Source> {
        match self {
            Evaluator::Risor(eval) => eval.source.as_ref(),
            Evaluator::Starlark(eval) => eval.source.as_ref(),
            Evaluator::Extism(eval) => eval.source.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RisorEvaluator {
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(serialize_with = "serde_duration::serialize")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarlarkEvaluator {
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(serialize_with = "serde_duration::serialize")]
    pub timeout: Duration,
}

/// WASM plugin evaluator; inline `code` is base64-encoded module bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtismEvaluator {
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub entrypoint: String,
}

/// Runs several script apps in sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompositeScriptApp {
    pub script_app_ids: Vec<String>,
    #[serde(skip_serializing_if = "StaticData::is_empty")]
    pub static_data: StaticData,
}

/// Model Context Protocol server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct McpApp {
    pub server_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<McpTransport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<McpTool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpTransport {
    pub sse_enabled: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sse_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct McpTool {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// JSON schema of the tool input, as a string.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub input_schema: String,
    /// Script handler; the only handler kind currently supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptApp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> CanonicalConfig {
        CanonicalConfig {
            listeners: vec![Listener {
                id: "public".into(),
                address: ":8080".into(),
                kind: ListenerKind::Http(HttpListenerOptions::default()),
            }],
            endpoints: vec![Endpoint {
                id: "main".into(),
                listener_ids: vec!["public".into()],
                routes: vec![Route {
                    app_id: "echo".into(),
                    matcher: Some(RouteMatcher::HttpPathPrefix("/echo".into())),
                    static_data: StaticData::new(),
                }],
                middlewares: Vec::new(),
            }],
            apps: vec![AppDefinition {
                id: "echo".into(),
                kind: AppKind::Echo(EchoApp { response: "hi".into() }),
            }],
            ..CanonicalConfig::default()
        }
    }

    #[test]
    fn test_serializes_in_document_shape() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["version"], "v1");
        assert_eq!(value["listeners"][0]["type"], "http");
        assert_eq!(value["listeners"][0]["http"]["read_timeout"], "10s");
        assert_eq!(value["endpoints"][0]["routes"][0]["http"]["path_prefix"], "/echo");
        assert_eq!(value["apps"][0]["type"], "echo");
        assert_eq!(value["apps"][0]["echo"]["response"], "hi");
        assert!(value.get("logging").is_none());
    }

    #[test]
    fn test_evaluator_source_serializes_under_its_key() {
        let app = ScriptApp {
            evaluator: Some(Evaluator::Risor(RisorEvaluator {
                source: Some(Source::Uri("file:///tmp/a.risor".into())),
                timeout: Duration::from_secs(5),
            })),
            static_data: StaticData::new(),
        };

        let value = serde_json::to_value(app).unwrap();
        assert_eq!(
            value,
            json!({"risor": {"uri": "file:///tmp/a.risor", "timeout": "5s"}})
        );
    }

    #[test]
    fn test_dangling_references() {
        let mut config = sample();
        assert!(config.dangling_references().is_empty());

        config.endpoints[0].routes[0].app_id = "missing".into();
        config.endpoints[0].listener_ids = vec!["nowhere".into()];
        let dangling = config.dangling_references();
        assert_eq!(dangling.len(), 2);
        assert!(dangling[0].contains("unknown listener 'nowhere'"));
        assert!(dangling[1].contains("unknown app 'missing'"));
    }

    #[test]
    fn test_endpoint_listener_reference() {
        let mut endpoint = Endpoint::default();
        assert_eq!(endpoint.listener_id(), None);
        endpoint.listener_ids = vec![MCP_LISTENER_ID.into()];
        assert_eq!(endpoint.listener_id(), Some(MCP_LISTENER_ID));
        assert!(endpoint.is_mcp());
    }
}
