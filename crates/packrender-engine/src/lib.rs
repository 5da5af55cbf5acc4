//! packrender engine: Jinja2 templating for packs
//!
//! A MiniJinja environment with Kubernetes-oriented filters (`toyaml`,
//! `b64encode`, `nindent`, ...) and functions (`dict`, `fail`, ...).
//! `Engine::render_pack` expands a loaded pack into rendered documents keyed
//! by output path.

pub mod engine;
pub mod error;
pub mod filters;
pub mod functions;

pub use engine::{Engine, EngineBuilder, RenderedDocuments};
pub use error::{EngineError, Result, TemplateError, TemplateErrorKind};
