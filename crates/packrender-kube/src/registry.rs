//! Typed validation for well-known Kubernetes kinds
//!
//! Each registered `apiVersion`/`kind` pair maps to a `k8s-openapi` type.
//! A document of a registered kind must deserialize into that type, which
//! catches wrong field types (`replicas: "three"`) and wrong nesting.

use k8s_openapi::Resource;
use k8s_openapi::api::{apps, autoscaling, batch, core, networking, policy, rbac};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

type Check = fn(&JsonValue) -> Result<(), serde_json::Error>;

fn typed_check<K: DeserializeOwned>(value: &JsonValue) -> Result<(), serde_json::Error> {
    K::deserialize(value).map(|_| ())
}

/// Lookup of `(apiVersion, kind)` to a typed check
#[derive(Clone, Default)]
pub struct KindRegistry {
    checks: HashMap<(String, String), Check>,
}

impl std::fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<String> = self
            .checks
            .keys()
            .map(|(api_version, kind)| format!("{}/{}", api_version, kind))
            .collect();
        kinds.sort();
        f.debug_struct("KindRegistry").field("kinds", &kinds).finish()
    }
}

impl KindRegistry {
    /// Registry with no kinds; every document is accepted as dynamic
    pub fn empty() -> Self {
        Self::default()
    }

    /// Workload, networking, RBAC and CRD kinds shipped with Kubernetes 1.31
    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        registry.register::<core::v1::ConfigMap>();
        registry.register::<core::v1::Secret>();
        registry.register::<core::v1::Service>();
        registry.register::<core::v1::ServiceAccount>();
        registry.register::<core::v1::Namespace>();
        registry.register::<core::v1::PersistentVolumeClaim>();
        registry.register::<core::v1::Pod>();

        registry.register::<apps::v1::Deployment>();
        registry.register::<apps::v1::StatefulSet>();
        registry.register::<apps::v1::DaemonSet>();
        registry.register::<apps::v1::ReplicaSet>();

        registry.register::<batch::v1::Job>();
        registry.register::<batch::v1::CronJob>();

        registry.register::<networking::v1::Ingress>();
        registry.register::<networking::v1::NetworkPolicy>();

        registry.register::<rbac::v1::Role>();
        registry.register::<rbac::v1::RoleBinding>();
        registry.register::<rbac::v1::ClusterRole>();
        registry.register::<rbac::v1::ClusterRoleBinding>();

        registry.register::<autoscaling::v2::HorizontalPodAutoscaler>();
        registry.register::<policy::v1::PodDisruptionBudget>();
        registry.register::<apiextensions::v1::CustomResourceDefinition>();

        registry
    }

    pub fn register<K: Resource + DeserializeOwned>(&mut self) {
        self.checks.insert(
            (K::API_VERSION.to_string(), K::KIND.to_string()),
            typed_check::<K>,
        );
    }

    pub fn contains(&self, api_version: &str, kind: &str) -> bool {
        self.checks
            .contains_key(&(api_version.to_string(), kind.to_string()))
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// `None` when the kind is not registered
    pub fn check(
        &self,
        api_version: &str,
        kind: &str,
        value: &JsonValue,
    ) -> Option<Result<(), serde_json::Error>> {
        self.checks
            .get(&(api_version.to_string(), kind.to_string()))
            .map(|check| check(value))
    }
}
