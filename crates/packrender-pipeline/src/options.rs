//! Per-call render configuration

use packrender_core::Values;
use packrender_repo::GitOptions;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RELEASE_NAME: &str = "release-name";
pub const DEFAULT_NAMESPACE: &str = "default";

/// Options for a single [`Renderer::render`](crate::Renderer::render) call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Applied to the source before fetching; never part of the cache key
    pub git: GitOptions,

    /// Overlay on top of the pack defaults
    pub values: Values,

    pub release_name: String,
    pub namespace: String,

    /// `capabilities.kubeVersion` seen by templates
    pub kube_version: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            git: GitOptions::default(),
            values: Values::new(),
            release_name: DEFAULT_RELEASE_NAME.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            kube_version: None,
        }
    }
}

impl RenderOptions {
    pub fn with_git(mut self, git: GitOptions) -> Self {
        self.git = git;
        self
    }

    pub fn with_values(mut self, values: Values) -> Self {
        self.values = values;
        self
    }

    pub fn with_release(mut self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.release_name = name.into();
        self.namespace = namespace.into();
        self
    }

    pub fn with_kube_version(mut self, version: impl Into<String>) -> Self {
        self.kube_version = Some(version.into());
        self
    }
}
