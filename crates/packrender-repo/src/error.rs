//! Error types for fetching and caching

use thiserror::Error;

/// Acquisition failures. Surfaced to callers unchanged.
#[derive(Debug, Error)]
pub enum FetchError {
    // ============ Source Errors ============
    #[error("Source not found: {source_path}")]
    SourceNotFound { source_path: String },

    #[error("Invalid source {source_location}: {reason}")]
    InvalidSource {
        source_location: String,
        reason: String,
    },

    // ============ Network Errors ============
    #[error("HTTP error: {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Integrity check failed for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid archive: {message}")]
    Archive { message: String },

    // ============ Git Errors ============
    #[error("git error: {message}")]
    Git { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network {
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache serialization error: {message}")]
    Serialization { message: String },

    #[error("Cache compression error: {message}")]
    Compression { message: String },

    #[error("Cache unavailable: {message}")]
    Unavailable { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;
