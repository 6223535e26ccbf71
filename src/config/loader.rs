//! The decode pipeline and configuration loading from disk.
//!
//! ```text
//! RawDocument → parse → version gate → structural decode → post-process → validate
//! ```
//!
//! The first three stages fail fast with a single error. Post-processing and
//! validation both run to completion and their problems are returned together.

use std::fs;
use std::path::Path;

use crate::config::errors::{ConfigError, ErrorList};
use crate::config::schema::CanonicalConfig;
use crate::config::validation::validate_config;
use crate::decode::parser::{DocumentFormat, ParsedTree, RawDocument};
use crate::decode::postprocess::post_process;
use crate::decode::skeleton::decode_skeleton;

/// Decode and validate a document into a canonical configuration.
pub fn decode_document(document: &RawDocument) -> Result<CanonicalConfig, ErrorList> {
    let tree = ParsedTree::parse(document)?;
    let version = tree.check_version()?;
    let skeleton = decode_skeleton(&tree)?;

    let (config, mut errors) = post_process(&tree, skeleton, version);
    drop(tree);

    if let Err(validation) = validate_config(&config) {
        errors.append(ErrorList::from(validation));
    }

    errors.into_result(config)
}

/// Read a document from disk, choosing its format by file extension.
pub fn read_document(path: &Path) -> Result<RawDocument, ConfigError> {
    let format = DocumentFormat::from_path(path)?;
    let content = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(RawDocument::new(format, content))
}

/// Load and validate configuration from a `.toml` or `.json` file.
pub fn load_config(path: &Path) -> Result<CanonicalConfig, ErrorList> {
    let document = read_document(path)?;
    decode_document(&document)
}
