//! Object references embedded in Cluster API resources
//!
//! Cluster API points at provider objects (infrastructure, control plane) with
//! a plain `ObjectReference` carrying `apiVersion`, `kind`, `name` and an
//! optional namespace.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference from a `Cluster` to a provider-owned object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterObjectReference {
    /// API version of the referenced object (e.g., "infrastructure.cluster.x-k8s.io/v1alpha3")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Kind of the referenced object (e.g., "PacketCluster")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Name of the referenced object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Namespace of the referenced object (defaults to the cluster's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ClusterObjectReference {
    /// Create a reference to an object in the same namespace as the referrer
    pub fn new(api_version: &str, kind: &str, name: &str) -> Self {
        Self {
            api_version: Some(api_version.to_string()),
            kind: Some(kind.to_string()),
            name: Some(name.to_string()),
            namespace: None,
        }
    }

    /// Namespace the reference resolves into, given the referrer's namespace
    pub fn resolved_namespace<'a>(&'a self, referrer_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(referrer_namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_namespace_defaults_to_referrer() {
        let reference = ClusterObjectReference::new(
            "infrastructure.cluster.x-k8s.io/v1alpha3",
            "PacketCluster",
            "edge-1",
        );
        assert_eq!(reference.resolved_namespace("fleet"), "fleet");
    }

    #[test]
    fn test_resolved_namespace_prefers_explicit() {
        let reference = ClusterObjectReference {
            namespace: Some("infra".to_string()),
            ..ClusterObjectReference::new("v1", "Secret", "creds")
        };
        assert_eq!(reference.resolved_namespace("fleet"), "infra");
    }
}
