//! packrender core: the pack model and everything needed to turn a pack
//! directory into validated render parameters.
//!
//! - `Pack` / `LoadedPack`: the on-disk package definition
//! - `Values`: parameter trees with deep merge
//! - `Schema`: values schema (JSON Schema or the simplified format)
//! - `TemplateContext`: variables handed to the template engine
//! - `loader`: `load` and `resolve_parameters`

pub mod context;
pub mod error;
pub mod loader;
pub mod pack;
pub mod schema;
pub mod values;

pub use context::{Capabilities, KubeVersion, PackInfo, ReleaseInfo, TemplateContext, TemplateInfo};
pub use error::{CoreError, Result, SCHEMA_VIOLATION_PREFIX, SchemaViolation, ValidationErrorInfo};
pub use loader::{load, resolve_parameters};
pub use pack::{EngineConfig, LoadedPack, Maintainer, Pack, PackKind, PackMetadata};
pub use schema::{PropertySpec, PropertyType, Schema, SchemaValidator, SimpleSchema, ValidationResult};
pub use values::Values;
