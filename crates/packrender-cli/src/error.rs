//! CLI error type and its exit codes

use miette::Diagnostic;
use packrender_engine::TemplateError;
use packrender_pipeline::RenderError;
use packrender_repo::CacheError;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Values rejected by the pack schema
    #[error("{message}")]
    #[diagnostic(
        code(packrender::cli::schema),
        help("Fix the values above or override them with -f/--set")
    )]
    Schema { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(TemplateError),

    #[error("{message}")]
    #[diagnostic(code(packrender::cli::load))]
    Load {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(packrender::cli::fetch))]
    Fetch {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(packrender::cli::decode))]
    Decode { message: String },

    #[error("Cache error: {message}")]
    #[diagnostic(code(packrender::cli::cache))]
    Cache { message: String },

    /// Bad command-line input (values files, --set)
    #[error("{message}")]
    #[diagnostic(code(packrender::cli::input))]
    Input { message: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(packrender::cli::io))]
    Io { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Schema { .. } => exit_codes::SCHEMA_ERROR,
            CliError::Template(_) => exit_codes::TEMPLATE_ERROR,
            CliError::Load { .. } => exit_codes::LOAD_ERROR,
            CliError::Fetch { .. } => exit_codes::FETCH_ERROR,
            CliError::Decode { .. } => exit_codes::DECODE_ERROR,
            CliError::Cache { .. } | CliError::Input { .. } | CliError::Io { .. } => {
                exit_codes::ERROR
            }
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }
}

impl From<RenderError> for CliError {
    fn from(err: RenderError) -> Self {
        let message = err.to_string();
        match err {
            RenderError::Template(e) => CliError::Template(e),
            RenderError::Schema(_) => CliError::Schema { message },
            RenderError::Load(_) => CliError::Load {
                message,
                help: Some("Check that the source (and --subpath) points at a directory with a Pack.yaml".to_string()),
            },
            RenderError::Fetch(_) => CliError::Fetch {
                message,
                help: Some("Check the source location, --branch and credentials".to_string()),
            },
            RenderError::Decode(_) => CliError::Decode { message },
        }
    }
}

impl From<CacheError> for CliError {
    fn from(err: CacheError) -> Self {
        CliError::Cache {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
