//! Pack definition and loading

use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::schema::Schema;

/// API version every `Pack.yaml` must declare
pub const PACK_API_VERSION: &str = "packrender/v1";

/// Pack manifest file name
pub const PACK_FILE: &str = "Pack.yaml";

/// Schema file names, in lookup order
const SCHEMA_CANDIDATES: [&str; 4] = [
    "values.schema.yaml",
    "values.schema.json",
    "schema.yaml",
    "schema.json",
];

/// Extensions picked up from `templates/`
const TEMPLATE_EXTENSIONS: [&str; 7] = ["yaml", "yml", "j2", "jinja2", "txt", "json", "tpl"];

/// Contents of `Pack.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pack {
    /// API version (packrender/v1)
    pub api_version: String,

    #[serde(default)]
    pub kind: PackKind,

    pub metadata: PackMetadata,

    #[serde(default)]
    pub engine: EngineConfig,
}

/// Pack type
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PackKind {
    #[default]
    Application,
    /// Helpers only, never rendered on its own
    Library,
}

/// Pack metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackMetadata {
    pub name: String,

    #[serde(with = "version_serde")]
    pub version: Version,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub app_version: Option<String>,

    /// Kubernetes version constraint
    #[serde(default)]
    pub kube_version: Option<String>,

    #[serde(default)]
    pub home: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub maintainers: Vec<Maintainer>,

    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Template engine settings declared by the pack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fail on undefined variables
    #[serde(default = "default_true")]
    pub strict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { strict: true }
    }
}

fn default_true() -> bool {
    true
}

/// A pack read from disk, with its resolved paths
#[derive(Debug, Clone)]
pub struct LoadedPack {
    pub pack: Pack,

    /// Root directory of the pack
    pub root: PathBuf,

    pub templates_dir: PathBuf,

    /// `values.yaml`, which may not exist
    pub values_path: PathBuf,

    pub schema_path: Option<PathBuf>,
}

impl LoadedPack {
    /// Load a pack from a directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(CoreError::PackNotFound {
                path: root.display().to_string(),
            });
        }

        let pack_file = root.join(PACK_FILE);
        if !pack_file.is_file() {
            return Err(CoreError::InvalidPack {
                message: format!("{} not found in {}", PACK_FILE, root.display()),
            });
        }

        let pack: Pack = serde_yaml::from_str(&std::fs::read_to_string(&pack_file)?)?;

        if pack.api_version != PACK_API_VERSION {
            return Err(CoreError::InvalidPack {
                message: format!(
                    "Unsupported API version: {}. Expected: {}",
                    pack.api_version, PACK_API_VERSION
                ),
            });
        }

        if pack.metadata.name.trim().is_empty() {
            return Err(CoreError::InvalidPack {
                message: "metadata.name must not be empty".to_string(),
            });
        }

        let schema_path = SCHEMA_CANDIDATES
            .iter()
            .map(|candidate| root.join(candidate))
            .find(|candidate| candidate.is_file());

        Ok(Self {
            templates_dir: root.join("templates"),
            values_path: root.join("values.yaml"),
            schema_path,
            pack,
            root,
        })
    }

    /// Pack name from metadata
    pub fn name(&self) -> &str {
        &self.pack.metadata.name
    }

    /// Load the schema if the pack ships one
    pub fn load_schema(&self) -> Result<Option<Schema>> {
        self.schema_path.as_deref().map(Schema::from_file).transpose()
    }

    /// Template files under `templates/`, sorted by path
    pub fn template_files(&self) -> Result<Vec<PathBuf>> {
        if !self.templates_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.templates_dir) {
            let entry = entry.map_err(|e| CoreError::Io(e.into()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let matches_ext = path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext.as_str()));
            if matches_ext {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Custom serde for semver::Version
mod version_serde {
    use semver::Version;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(version: &Version, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&version.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Version, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}
