//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config document (TOML/JSON)
//!     → decode::parser (parse, version gate)
//!     → decode::skeleton (structural decode)
//!     → decode::postprocess (discriminators, legacy shapes)
//!     → validation.rs (semantic checks)
//!     → CanonicalConfig (validated, immutable)
//!     → store::ConfigStore (atomic swap, reload signal)
//!
//! On file change or SIGHUP:
//!     watcher.rs detects change
//!     → loader.rs reads the document
//!     → ConfigStore::update runs the pipeline
//!     → subsystems woken by the reload signal re-read the store
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full replacement
//! - All problems in a document are reported together
//! - Validation separates structural (serde) from semantic checks

pub mod duration;
pub mod errors;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use errors::{ConfigError, ErrorKind, ErrorList, ValidationCategory, ValidationError};
pub use loader::{decode_document, load_config};
pub use schema::CanonicalConfig;
