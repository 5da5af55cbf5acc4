//! Engine errors

use miette::{Diagnostic, NamedSource, SourceSpan};
use packrender_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to read templates: {0}")]
    Pack(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownFunction,
    SyntaxError,
    TypeError,
    InvalidOperation,
    MissingTemplate,
    Other,
}

impl TemplateErrorKind {
    pub fn to_code_string(&self) -> &'static str {
        match self {
            Self::UndefinedVariable => "undefined_variable",
            Self::UnknownFilter => "unknown_filter",
            Self::UnknownFunction => "unknown_function",
            Self::SyntaxError => "syntax",
            Self::TypeError => "type",
            Self::InvalidOperation => "invalid_operation",
            Self::MissingTemplate => "missing_template",
            Self::Other => "render",
        }
    }
}

impl From<minijinja::ErrorKind> for TemplateErrorKind {
    fn from(kind: minijinja::ErrorKind) -> Self {
        use minijinja::ErrorKind as K;
        match kind {
            K::UndefinedError => Self::UndefinedVariable,
            K::UnknownFilter => Self::UnknownFilter,
            K::UnknownFunction => Self::UnknownFunction,
            K::SyntaxError => Self::SyntaxError,
            K::InvalidOperation => Self::InvalidOperation,
            K::NonPrimitive | K::NonKey | K::TooManyArguments | K::MissingArgument => {
                Self::TypeError
            }
            K::TemplateNotFound => Self::MissingTemplate,
            _ => Self::Other,
        }
    }
}

/// A failed template expansion.
///
/// `Display` is MiniJinja's own message, untouched, so callers can compare it
/// against what the engine reported.
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(packrender::template::render))]
pub struct TemplateError {
    pub message: String,

    pub kind: TemplateErrorKind,

    /// Output-style name of the failing document
    pub name: Option<String>,

    pub line: Option<usize>,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("error occurred here")]
    pub span: Option<SourceSpan>,
}

impl TemplateError {
    /// Wrap a MiniJinja error.
    ///
    /// `lookup_source` maps a template name to its text so the span can point
    /// at the document that actually failed, which may be an included partial.
    pub fn from_minijinja<'a>(
        err: &minijinja::Error,
        fallback_name: &str,
        lookup_source: impl Fn(&str) -> Option<&'a str>,
    ) -> Self {
        let name = err.name().unwrap_or(fallback_name).to_string();
        let source = lookup_source(&name).unwrap_or_default();
        let line = err.line();

        Self {
            message: err.to_string(),
            kind: err.kind().into(),
            span: line.and_then(|l| line_span(source, l)),
            src: NamedSource::new(name.clone(), source.to_string()),
            name: Some(name),
            line,
        }
    }

    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// Byte span of a 1-based line
fn line_span(source: &str, line: usize) -> Option<SourceSpan> {
    let mut offset = 0;
    for (idx, text) in source.split('\n').enumerate() {
        if idx + 1 == line {
            return Some(SourceSpan::new(offset.into(), text.len()));
        }
        offset += text.len() + 1;
    }
    None
}
