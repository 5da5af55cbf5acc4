//! Rendered documents to resource objects

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::error::{DecodeError, Result};
use crate::registry::KindRegistry;
use crate::resource::{RenderResult, ResourceObject};

/// Only outputs with this suffix are resource manifests
pub const MANIFEST_SUFFIX: &str = ".yaml";

#[derive(Debug, Clone)]
pub struct ManifestDecoder {
    registry: KindRegistry,
    strict_kinds: bool,
}

impl Default for ManifestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestDecoder {
    /// Decoder backed by [`KindRegistry::builtin`], accepting unknown kinds
    pub fn new() -> Self {
        Self {
            registry: KindRegistry::builtin(),
            strict_kinds: false,
        }
    }

    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Reject kinds the registry does not know
    pub fn strict_kinds(mut self, strict: bool) -> Self {
        self.strict_kinds = strict;
        self
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Decode every `.yaml` output, in key order.
    ///
    /// Other outputs (notes, text, json) are skipped. The first failure aborts
    /// the whole batch.
    pub fn decode(&self, documents: &BTreeMap<String, String>) -> Result<RenderResult> {
        let mut resources = Vec::new();

        for (path, text) in documents {
            if !path.ends_with(MANIFEST_SUFFIX) {
                tracing::trace!(path = %path, "not a manifest, skipping");
                continue;
            }
            resources.push(self.decode_one(path, text)?);
        }

        Ok(resources)
    }

    /// Decode a single rendered manifest named `path`
    pub fn decode_one(&self, path: &str, text: &str) -> Result<ResourceObject> {
        let value = single_document(path, text)?;

        let field = |name: &'static str| {
            value
                .get(name)
                .and_then(JsonValue::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| DecodeError::MissingField {
                    path: path.to_string(),
                    field: name,
                })
        };
        let api_version = field("apiVersion")?;
        let kind = field("kind")?;

        match self.registry.check(&api_version, &kind, &value) {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                return Err(DecodeError::InvalidResource {
                    path: path.to_string(),
                    api_version,
                    kind,
                    message: e.to_string(),
                });
            }
            None if self.strict_kinds => {
                return Err(DecodeError::UnknownKind {
                    path: path.to_string(),
                    api_version,
                    kind,
                });
            }
            None => {
                tracing::debug!(path = %path, %api_version, %kind, "accepting unregistered kind");
            }
        }

        ResourceObject::from_json(value).map_err(|e| DecodeError::InvalidResource {
            path: path.to_string(),
            api_version,
            kind,
            message: e.to_string(),
        })
    }
}

/// Parse `text` and return its only non-empty document.
///
/// Empty and comment-only documents (as produced by a leading `---`) are ignored.
fn single_document(path: &str, text: &str) -> Result<JsonValue> {
    let mut documents = Vec::new();

    for document in serde_yaml::Deserializer::from_str(text) {
        let value = JsonValue::deserialize(document).map_err(|e| DecodeError::Yaml {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        if !value.is_null() {
            documents.push(value);
        }
    }

    match documents.len() {
        0 => Err(DecodeError::Empty {
            path: path.to_string(),
        }),
        1 => Ok(documents.remove(0)),
        count => Err(DecodeError::MultipleDocuments {
            path: path.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 2
  selector:
    matchLabels: { app: web }
  template:
    metadata:
      labels: { app: web }
    spec:
      containers:
        - name: web
          image: nginx:1.27
"#;

    fn docs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_only_yaml_outputs_are_decoded() {
        let decoder = ManifestDecoder::new();
        let result = decoder
            .decode(&docs(&[
                ("app/templates/deployment.yaml", DEPLOYMENT),
                ("app/templates/NOTES.txt", "not yaml: [at all"),
                ("app/templates/config.json", "{}"),
                ("app/templates/extra.yml", "garbage: ["),
            ]))
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind(), "Deployment");
    }

    #[test]
    fn test_leading_separator_and_comments_ignored() {
        let text = format!("---\n# generated\n{}", DEPLOYMENT);
        let obj = ManifestDecoder::new().decode_one("d.yaml", &text).unwrap();
        assert_eq!(obj.name(), Some("web"));
    }

    #[test]
    fn test_multiple_documents_rejected() {
        let text = format!("{}\n---\n{}", DEPLOYMENT, DEPLOYMENT);
        let err = ManifestDecoder::new().decode_one("d.yaml", &text).unwrap_err();
        assert!(matches!(err, DecodeError::MultipleDocuments { count: 2, .. }));
    }

    #[test]
    fn test_missing_kind() {
        let err = ManifestDecoder::new()
            .decode_one("x.yaml", "apiVersion: v1\nmetadata:\n  name: x\n")
            .unwrap_err();
        assert_eq!(err.to_string(), "x.yaml: resource is missing 'kind'");
    }

    #[test]
    fn test_typed_validation_failure_names_path() {
        let text = DEPLOYMENT.replace("replicas: 2", "replicas: two");
        let err = ManifestDecoder::new()
            .decode(&docs(&[("app/templates/deployment.yaml", text.as_str())]))
            .unwrap_err();

        assert!(matches!(err, DecodeError::InvalidResource { .. }));
        assert_eq!(err.path(), "app/templates/deployment.yaml");
    }

    #[test]
    fn test_unknown_kinds() {
        let widget = "apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: w\nspec:\n  size: 3\n";

        let obj = ManifestDecoder::new().decode_one("w.yaml", widget).unwrap();
        assert_eq!(obj.body()["spec"]["size"], 3);

        let err = ManifestDecoder::new()
            .strict_kinds(true)
            .decode_one("w.yaml", widget)
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownKind { .. }));
    }

    #[test]
    fn test_first_error_aborts_batch() {
        let result = ManifestDecoder::new().decode(&docs(&[
            ("a/templates/a.yaml", "kind: ConfigMap\n"),
            ("a/templates/b.yaml", DEPLOYMENT),
        ]));
        let err = result.unwrap_err();
        assert_eq!(err.path(), "a/templates/a.yaml");
    }

    #[test]
    fn test_malformed_yaml() {
        let err = ManifestDecoder::new()
            .decode_one("bad.yaml", "kind: [unclosed")
            .unwrap_err();
        assert!(matches!(err, DecodeError::Yaml { .. }));
    }
}
