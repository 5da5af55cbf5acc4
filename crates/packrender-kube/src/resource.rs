//! Decoded resource objects

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use kube::core::{GroupVersionKind, TypeMeta};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Decoded resources of one render, in output-path order
pub type RenderResult = Vec<ResourceObject>;

/// One structured manifest: type information, metadata and the free-form body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceObject(DynamicObject);

impl ResourceObject {
    /// Minimal object with only type and name, mostly useful for seeding caches
    pub fn new(api_version: &str, kind: &str, name: &str) -> Self {
        Self(DynamicObject {
            types: Some(TypeMeta {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
            }),
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..ObjectMeta::default()
            },
            data: JsonValue::Object(Default::default()),
        })
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.0.metadata.namespace = Some(namespace.to_string());
        self
    }

    pub fn from_json(value: JsonValue) -> serde_json::Result<Self> {
        serde_json::from_value(value).map(Self)
    }

    pub fn api_version(&self) -> &str {
        self.0
            .types
            .as_ref()
            .map(|t| t.api_version.as_str())
            .unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        self.0
            .types
            .as_ref()
            .map(|t| t.kind.as_str())
            .unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.0.metadata.name.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.0.metadata.namespace.as_deref()
    }

    pub fn metadata(&self) -> &ObjectMeta {
        &self.0.metadata
    }

    /// Everything besides type and metadata (`spec`, `data`, ...)
    pub fn body(&self) -> &JsonValue {
        &self.0.data
    }

    pub fn gvk(&self) -> GroupVersionKind {
        let (group, version) = match self.api_version().rsplit_once('/') {
            Some((g, v)) => (g, v),
            None => ("", self.api_version()),
        };
        GroupVersionKind::gvk(group, version, self.kind())
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(&self.0).unwrap_or(JsonValue::Null)
    }

    pub fn as_dynamic(&self) -> &DynamicObject {
        &self.0
    }

    pub fn into_dynamic(self) -> DynamicObject {
        self.0
    }

    /// `kind/name` or `kind/namespace/name`, for log lines
    pub fn display_name(&self) -> String {
        let name = self.name().unwrap_or("unnamed");
        match self.namespace() {
            Some(ns) => format!("{}/{}/{}", self.kind(), ns, name),
            None => format!("{}/{}", self.kind(), name),
        }
    }
}

impl PartialEq for ResourceObject {
    fn eq(&self, other: &Self) -> bool {
        self.to_json() == other.to_json()
    }
}

impl From<DynamicObject> for ResourceObject {
    fn from(obj: DynamicObject) -> Self {
        Self(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let obj = ResourceObject::from_json(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": "web", "namespace": "shop" },
            "spec": { "replicas": 2 }
        }))
        .unwrap();

        assert_eq!(obj.api_version(), "apps/v1");
        assert_eq!(obj.kind(), "Deployment");
        assert_eq!(obj.name(), Some("web"));
        assert_eq!(obj.namespace(), Some("shop"));
        assert_eq!(obj.body()["spec"]["replicas"], 2);
        assert_eq!(obj.display_name(), "Deployment/shop/web");

        let gvk = obj.gvk();
        assert_eq!((gvk.group.as_str(), gvk.version.as_str()), ("apps", "v1"));
    }

    #[test]
    fn test_core_group_is_empty() {
        let obj = ResourceObject::new("v1", "ConfigMap", "settings");
        let gvk = obj.gvk();
        assert_eq!(gvk.group, "");
        assert_eq!(gvk.version, "v1");
    }

    #[test]
    fn test_json_shape_is_flat() {
        let obj = ResourceObject::new("apps/v1", "Deployment", "fake-deployment").with_namespace("default");
        assert_eq!(
            obj.to_json(),
            json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": { "name": "fake-deployment", "namespace": "default" }
            })
        );
        assert_eq!(ResourceObject::from_json(obj.to_json()).unwrap(), obj);
    }
}
