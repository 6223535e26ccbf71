//! Document parsing and the version gate.
//!
//! Raw bytes in either supported format become one order-preserving
//! [`ParsedTree`] of `serde_json` values, so every later stage sees the same
//! generic shape regardless of the source format.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::config::errors::{ConfigError, ParseFailure};
use crate::config::schema::SUPPORTED_VERSION;

/// Source format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    /// Pick a format from a file extension, case-insensitively.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "toml" => Some(DocumentFormat::Toml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    /// Pick a format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| ConfigError::UnsupportedExtension {
            extension: extension.to_string(),
        })
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Toml => f.write_str("TOML"),
            DocumentFormat::Json => f.write_str("JSON"),
        }
    }
}

/// Undecoded document bytes tagged with their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub format: DocumentFormat,
    pub content: Vec<u8>,
}

impl RawDocument {
    pub fn new(format: DocumentFormat, content: impl Into<Vec<u8>>) -> Self {
        Self {
            format,
            content: content.into(),
        }
    }

    pub fn toml(content: impl Into<Vec<u8>>) -> Self {
        Self::new(DocumentFormat::Toml, content)
    }

    pub fn json(content: impl Into<Vec<u8>>) -> Self {
        Self::new(DocumentFormat::Json, content)
    }
}

/// Generic nested representation of a parsed document.
///
/// The root is always a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTree {
    root: Value,
}

impl ParsedTree {
    /// Parse a raw document. Fails fast on empty input or bad syntax.
    pub fn parse(document: &RawDocument) -> Result<Self, ConfigError> {
        if document.content.is_empty() {
            return Err(ConfigError::EmptyDocument);
        }

        let syntax = |source: ParseFailure| ConfigError::Syntax {
            format: document.format,
            source,
        };

        let root = match document.format {
            DocumentFormat::Toml => {
                let text = std::str::from_utf8(&document.content)
                    .map_err(|e| syntax(ParseFailure::Utf8(e)))?;
                let table: toml::Table =
                    toml::from_str(text).map_err(|e| syntax(ParseFailure::Toml(e)))?;
                Value::Object(toml_table_to_json(table))
            }
            DocumentFormat::Json => {
                let value: Value = serde_json::from_slice(&document.content)
                    .map_err(|e| syntax(ParseFailure::Json(e)))?;
                if !value.is_object() {
                    return Err(syntax(ParseFailure::RootNotTable));
                }
                value
            }
        };

        Ok(Self { root })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Elements of a top-level array, or an empty slice if absent or not an array.
    pub fn array(&self, key: &str) -> &[Value] {
        match self.root.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Read only the `version` field and check it.
    ///
    /// Absent or empty means the supported version.
    pub fn check_version(&self) -> Result<String, ConfigError> {
        let version = match self.root.get("version") {
            None | Some(Value::Null) => return Ok(SUPPORTED_VERSION.to_string()),
            Some(Value::String(s)) if s.is_empty() => return Ok(SUPPORTED_VERSION.to_string()),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        if version == SUPPORTED_VERSION {
            Ok(version)
        } else {
            Err(ConfigError::UnsupportedVersion { version })
        }
    }
}

fn toml_table_to_json(table: toml::Table) -> Map<String, Value> {
    table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect()
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(toml_table_to_json(table)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::errors::ErrorKind;

    #[test]
    fn test_parse_toml_preserves_order() {
        let doc = RawDocument::toml("zeta = 1\nalpha = \"a\"\n[[listeners]]\nid = \"l1\"\n");
        let tree = ParsedTree::parse(&doc).unwrap();

        let keys: Vec<&String> = tree.root().as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "listeners"]);
        assert_eq!(tree.array("listeners").len(), 1);
        assert!(tree.array("apps").is_empty());
    }

    #[test]
    fn test_parse_json() {
        let doc = RawDocument::json(r#"{"version": "v1", "apps": [{"id": "a"}]}"#);
        let tree = ParsedTree::parse(&doc).unwrap();
        assert_eq!(tree.array("apps")[0]["id"], "a");
    }

    #[test]
    fn test_empty_input_fails_fast() {
        let err = ParsedTree::parse(&RawDocument::toml("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyDocument);
    }

    #[test]
    fn test_syntax_errors() {
        let err = ParsedTree::parse(&RawDocument::toml("listeners = [")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert!(err.to_string().contains("TOML"));

        let err = ParsedTree::parse(&RawDocument::json("[1, 2]")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert!(err.to_string().contains("table"));
    }

    #[test]
    fn test_version_gate() {
        let tree = ParsedTree::parse(&RawDocument::toml("[logging]\nlevel = \"info\"")).unwrap();
        assert_eq!(tree.check_version().unwrap(), "v1");

        let tree = ParsedTree::parse(&RawDocument::toml("version = \"\"")).unwrap();
        assert_eq!(tree.check_version().unwrap(), "v1");

        let tree = ParsedTree::parse(&RawDocument::toml("version = \"v2\"")).unwrap();
        let err = tree.check_version().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
        assert!(err.to_string().contains("v2"));

        let tree = ParsedTree::parse(&RawDocument::toml("version = 2")).unwrap();
        assert!(tree.check_version().is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("/etc/gw/config.TOML")).unwrap(),
            DocumentFormat::Toml
        );
        let err = DocumentFormat::from_path(Path::new("config.yaml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedExtension);
    }
}
