//! Error taxonomy for the decode/validate pipeline.
//!
//! # Design Decisions
//! - Fatal preconditions (empty input, syntax, version, structure) and
//!   per-element problems share one enum so callers match on one type
//! - Problems are aggregated in an [`ErrorList`], never short-circuited
//! - [`ErrorKind`] gives callers a cheap way to ask "is this problem among them"

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::decode::parser::DocumentFormat;

/// Which oneof family a discriminator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantFamily {
    ListenerType,
    MiddlewareType,
    AppType,
    Evaluator,
    ToolHandler,
    RouteMatcher,
    LogFormat,
    LogLevel,
    LogPreset,
}

impl fmt::Display for VariantFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantFamily::ListenerType => "listener type",
            VariantFamily::MiddlewareType => "middleware type",
            VariantFamily::AppType => "app type",
            VariantFamily::Evaluator => "evaluator",
            VariantFamily::ToolHandler => "tool handler",
            VariantFamily::RouteMatcher => "route matcher",
            VariantFamily::LogFormat => "log format",
            VariantFamily::LogLevel => "log level",
            VariantFamily::LogPreset => "console logger preset",
        };
        f.write_str(name)
    }
}

/// Underlying format error wrapped by [`ConfigError::Syntax`].
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("document root must be a table")]
    RootNotTable,
}

/// A single problem found while loading, decoding, or validating a document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no source data provided")]
    EmptyDocument,

    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: '{extension}'")]
    UnsupportedExtension { extension: String },

    #[error("failed to parse {format} document: {source}")]
    Syntax {
        format: DocumentFormat,
        #[source]
        source: ParseFailure,
    },

    #[error("version {version} is not supported: unsupported config version")]
    UnsupportedVersion { version: String },

    #[error("failed to decode config structure: {source}")]
    StructuralDecode {
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: unsupported {family}: {value}")]
    UnsupportedKind {
        context: String,
        family: VariantFamily,
        value: String,
    },

    #[error("{context}: missing required {family}")]
    MissingDiscriminator {
        context: String,
        family: VariantFamily,
    },

    #[error("{context}: only one {family} may be set, found {}", choices.join(", "))]
    AmbiguousVariant {
        context: String,
        family: VariantFamily,
        choices: Vec<String>,
    },

    #[error("{collection} at index {index}: invalid format, expected a table")]
    MalformedElement { collection: String, index: usize },

    #[error("{context}: invalid {field} '{value}': {reason}")]
    InvalidField {
        context: String,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Fieldless mirror of [`ConfigError`] used for cause matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyDocument,
    Io,
    UnsupportedExtension,
    Syntax,
    UnsupportedVersion,
    StructuralDecode,
    UnsupportedKind,
    MissingDiscriminator,
    AmbiguousVariant,
    MalformedElement,
    InvalidField,
    Validation(ValidationCategory),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::EmptyDocument => ErrorKind::EmptyDocument,
            ConfigError::Io { .. } => ErrorKind::Io,
            ConfigError::UnsupportedExtension { .. } => ErrorKind::UnsupportedExtension,
            ConfigError::Syntax { .. } => ErrorKind::Syntax,
            ConfigError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            ConfigError::StructuralDecode { .. } => ErrorKind::StructuralDecode,
            ConfigError::UnsupportedKind { .. } => ErrorKind::UnsupportedKind,
            ConfigError::MissingDiscriminator { .. } => ErrorKind::MissingDiscriminator,
            ConfigError::AmbiguousVariant { .. } => ErrorKind::AmbiguousVariant,
            ConfigError::MalformedElement { .. } => ErrorKind::MalformedElement,
            ConfigError::InvalidField { .. } => ErrorKind::InvalidField,
            ConfigError::Validation(err) => ErrorKind::Validation(err.category),
        }
    }

    pub(crate) fn unsupported(
        context: impl Into<String>,
        family: VariantFamily,
        value: impl Into<String>,
    ) -> Self {
        ConfigError::UnsupportedKind {
            context: context.into(),
            family,
            value: value.into(),
        }
    }

    pub(crate) fn malformed(collection: impl Into<String>, index: usize) -> Self {
        ConfigError::MalformedElement {
            collection: collection.into(),
            index,
        }
    }
}

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ValidationCategory {
    #[error("empty ID")]
    EmptyId,
    #[error("missing required field")]
    MissingRequiredField,
    #[error("duplicate ID")]
    DuplicateId,
    #[error("invalid value")]
    InvalidValue,
}

/// An invariant violation found by the validator.
///
/// `context` reads like a sentence fragment naming the offending entity,
/// e.g. `listener 'public' has an empty address`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{context}: {category}")]
pub struct ValidationError {
    pub context: String,
    pub category: ValidationCategory,
}

impl ValidationError {
    pub fn new(category: ValidationCategory, context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            category,
        }
    }
}

/// Zero or more problems collected over a whole document.
#[derive(Debug, Default)]
pub struct ErrorList(Vec<ConfigError>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: impl Into<ConfigError>) {
        self.0.push(err.into());
    }

    pub fn append(&mut self, other: ErrorList) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigError> {
        self.0.iter()
    }

    /// Returns true if any collected problem is of the given kind.
    pub fn has(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|err| err.kind() == kind)
    }

    /// Returns true if any collected problem is a validation failure, whatever its category.
    pub fn has_validation(&self) -> bool {
        self.0
            .iter()
            .any(|err| matches!(err, ConfigError::Validation(_)))
    }

    /// Rendered messages, one per problem.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// `Ok(value)` when nothing was collected, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, ErrorList> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            0 => f.write_str("no configuration errors"),
            1 => write!(f, "{}", self.0[0]),
            n => {
                write!(f, "{} configuration errors: ", n)?;
                for (i, err) in self.0.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ErrorList {}

impl From<ConfigError> for ErrorList {
    fn from(err: ConfigError) -> Self {
        Self(vec![err])
    }
}

impl From<Vec<ValidationError>> for ErrorList {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors.into_iter().map(ConfigError::Validation).collect())
    }
}

impl Extend<ConfigError> for ErrorList {
    fn extend<I: IntoIterator<Item = ConfigError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ErrorList {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a ConfigError;
    type IntoIter = std::slice::Iter<'a, ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
