//! Variables exposed to templates

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::pack::PackMetadata;
use crate::values::Values;

/// Root template context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
    pub values: JsonValue,
    pub release: ReleaseInfo,
    pub pack: PackInfo,
    pub capabilities: Capabilities,
    pub template: TemplateInfo,
}

/// The release a pack is rendered for
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseInfo {
    pub name: String,
    pub namespace: String,
    pub revision: u32,
    pub is_install: bool,
    pub is_upgrade: bool,

    /// Always "packrender"
    pub service: String,
}

impl ReleaseInfo {
    /// First revision of a fresh release
    pub fn for_install(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            revision: 1,
            is_install: true,
            is_upgrade: false,
            service: "packrender".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackInfo {
    pub name: String,
    pub version: String,
    pub app_version: Option<String>,
}

impl From<&PackMetadata> for PackInfo {
    fn from(meta: &PackMetadata) -> Self {
        Self {
            name: meta.name.clone(),
            version: meta.version.to_string(),
            app_version: meta.app_version.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub kube_version: KubeVersion,
    pub api_versions: Vec<String>,
}

impl Capabilities {
    pub fn for_version(version: &str) -> Self {
        Self {
            kube_version: KubeVersion::new(version),
            api_versions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubeVersion {
    pub version: String,
    pub major: String,
    pub minor: String,
}

impl Default for KubeVersion {
    fn default() -> Self {
        Self::new("v1.31.0")
    }
}

impl KubeVersion {
    /// Parse `v1.29.3`, `1.29` or `1`. Missing parts fall back to 1.31.
    pub fn new(version: &str) -> Self {
        let version = version.trim().trim_start_matches('v');
        let mut parts = version.split('.');
        let major = parts.next().filter(|p| !p.is_empty()).unwrap_or("1");
        let minor = parts.next().filter(|p| !p.is_empty()).unwrap_or("31");

        Self {
            version: format!("v{}", version),
            major: major.to_string(),
            minor: minor.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub name: String,
    pub base_path: String,
}

impl TemplateContext {
    pub fn new(values: Values, release: ReleaseInfo, pack: &PackMetadata) -> Self {
        Self {
            values: values.into_inner(),
            release,
            pack: PackInfo::from(pack),
            capabilities: Capabilities::default(),
            template: TemplateInfo::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Copy of this context pointing at one template
    pub fn for_template(&self, name: &str, base_path: &str) -> Self {
        let mut ctx = self.clone();
        ctx.template = TemplateInfo {
            name: name.to_string(),
            base_path: base_path.to_string(),
        };
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    fn metadata() -> PackMetadata {
        serde_yaml::from_str("name: web\nversion: 1.2.0\nappVersion: \"3.4\"\n").unwrap()
    }

    #[test]
    fn test_context_serializes_camel_case() {
        let values = Values::from_yaml("replicas: 3").unwrap();
        let ctx = TemplateContext::new(
            values,
            ReleaseInfo::for_install("demo", "staging"),
            &metadata(),
        )
        .for_template("web/templates/svc.yaml", "web/templates");

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["values"]["replicas"], 3);
        assert_eq!(json["release"]["name"], "demo");
        assert_eq!(json["release"]["isInstall"], true);
        assert_eq!(json["pack"]["appVersion"], "3.4");
        assert_eq!(json["capabilities"]["kubeVersion"]["minor"], "31");
        assert_eq!(json["template"]["basePath"], "web/templates");
        assert_eq!(
            Version::parse(json["pack"]["version"].as_str().unwrap()).unwrap(),
            Version::new(1, 2, 0)
        );
    }

    #[test]
    fn test_kube_version_parsing() {
        let v = KubeVersion::new("v1.29.3");
        assert_eq!((v.major.as_str(), v.minor.as_str()), ("1", "29"));
        assert_eq!(v.version, "v1.29.3");

        let v = KubeVersion::new("1");
        assert_eq!(v.minor, "31");
    }
}
