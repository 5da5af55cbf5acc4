//! Error types for packrender-kube

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DecodeError>;

/// A rendered document that could not become a resource object.
///
/// Every variant names the output path it came from.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("failed to parse {path}: {message}")]
    Yaml { path: String, message: String },

    #[error("{path} contains no resource document")]
    Empty { path: String },

    #[error("{path} contains {count} documents, expected exactly one")]
    MultipleDocuments { path: String, count: usize },

    #[error("{path}: resource is missing '{field}'")]
    MissingField { path: String, field: &'static str },

    #[error("{path}: invalid {api_version} {kind}: {message}")]
    InvalidResource {
        path: String,
        api_version: String,
        kind: String,
        message: String,
    },

    #[error("{path}: unknown resource type {api_version} {kind}")]
    UnknownKind {
        path: String,
        api_version: String,
        kind: String,
    },
}

impl DecodeError {
    /// Output path of the offending document
    pub fn path(&self) -> &str {
        match self {
            Self::Yaml { path, .. }
            | Self::Empty { path }
            | Self::MultipleDocuments { path, .. }
            | Self::MissingField { path, .. }
            | Self::InvalidResource { path, .. }
            | Self::UnknownKind { path, .. } => path,
        }
    }
}
