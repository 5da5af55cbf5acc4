//! Core error types

use thiserror::Error;

/// Stable prefix of every schema violation message.
///
/// Callers match on this text to tell a values problem apart from a broken pack.
pub const SCHEMA_VIOLATION_PREFIX: &str =
    "values don't meet the specifications of the schema(s) in the following chart(s):";

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Pack not found: {path}")]
    PackNotFound { path: String },

    #[error("Invalid Pack.yaml: {message}")]
    InvalidPack { message: String },

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error(transparent)]
    SchemaViolation(#[from] SchemaViolation),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Values merge error: {message}")]
    ValuesMerge { message: String },
}

impl CoreError {
    /// True when the error reports values rejected by the pack schema
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, CoreError::SchemaViolation(_))
    }
}

/// One failed schema check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrorInfo {
    /// JSON pointer to the offending value, `(root)` for the document itself
    pub path: String,
    pub message: String,
}

/// Values rejected by a pack's schema
#[derive(Error, Debug, Clone)]
#[error("{}", render_violation(.pack, .errors))]
pub struct SchemaViolation {
    pub pack: String,
    pub errors: Vec<ValidationErrorInfo>,
}

fn render_violation(pack: &str, errors: &[ValidationErrorInfo]) -> String {
    let mut out = format!("{}\n{}:", SCHEMA_VIOLATION_PREFIX, pack);
    for err in errors {
        out.push_str(&format!("\n- {}: {}", err.path, err.message));
    }
    out
}

pub type Result<T> = std::result::Result<T, CoreError>;
