//! packrender kube: turns rendered manifests into Kubernetes resource objects
//!
//! `ManifestDecoder` picks the `.yaml` outputs of a render, parses each as a
//! single document and checks well-known kinds against their `k8s-openapi`
//! types through a `KindRegistry`.

pub mod decoder;
pub mod error;
pub mod registry;
pub mod resource;

pub use decoder::{MANIFEST_SUFFIX, ManifestDecoder};
pub use error::{DecodeError, Result};
pub use registry::KindRegistry;
pub use resource::{RenderResult, ResourceObject};
