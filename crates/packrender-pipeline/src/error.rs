//! Render failures
//!
//! Every variant is transparent: the message a caller sees is the message the
//! failing stage produced.

use packrender_core::CoreError;
use packrender_engine::{EngineError, TemplateError};
use packrender_kube::DecodeError;
use packrender_repo::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The working path does not hold a loadable pack
    #[error(transparent)]
    Load(CoreError),

    /// Values rejected by the pack schema
    #[error(transparent)]
    Schema(CoreError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Stage a render failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderErrorKind {
    Fetch,
    Load,
    Schema,
    Template,
    Decode,
}

impl RenderError {
    pub fn kind(&self) -> RenderErrorKind {
        match self {
            Self::Fetch(_) => RenderErrorKind::Fetch,
            Self::Load(_) => RenderErrorKind::Load,
            Self::Schema(_) => RenderErrorKind::Schema,
            Self::Template(_) => RenderErrorKind::Template,
            Self::Decode(_) => RenderErrorKind::Decode,
        }
    }

    pub fn is_schema_violation(&self) -> bool {
        self.kind() == RenderErrorKind::Schema
    }
}

impl From<CoreError> for RenderError {
    fn from(e: CoreError) -> Self {
        if e.is_schema_violation() {
            Self::Schema(e)
        } else {
            Self::Load(e)
        }
    }
}

impl From<EngineError> for RenderError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Template(e) => Self::Template(e),
            EngineError::Pack(e) => Self::Load(e),
            EngineError::Io(e) => Self::Load(CoreError::Io(e)),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use packrender_core::{SCHEMA_VIOLATION_PREFIX, SchemaViolation};

    #[test]
    fn test_core_errors_are_split_by_kind() {
        let violation = RenderError::from(CoreError::from(SchemaViolation {
            pack: "fake-app".to_string(),
            errors: Vec::new(),
        }));
        assert_eq!(violation.kind(), RenderErrorKind::Schema);
        assert!(violation.to_string().starts_with(SCHEMA_VIOLATION_PREFIX));

        let missing = RenderError::from(CoreError::PackNotFound {
            path: "/nowhere".to_string(),
        });
        assert_eq!(missing.kind(), RenderErrorKind::Load);
        assert_eq!(missing.to_string(), "Pack not found: /nowhere");
    }

    #[test]
    fn test_engine_io_is_a_load_error() {
        let err = RenderError::from(EngineError::Io(std::io::Error::other("gone")));
        assert_eq!(err.kind(), RenderErrorKind::Load);
    }

    #[test]
    fn test_fetch_message_is_untouched() {
        let err = RenderError::from(FetchError::Git {
            message: "fatal: repository not found".to_string(),
        });
        assert_eq!(err.to_string(), "git error: fatal: repository not found");
    }
}
