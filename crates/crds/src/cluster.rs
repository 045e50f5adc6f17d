//! Cluster CRD
//!
//! A workload cluster registered in the management cluster. The helper treats
//! these records as read-only descriptors: the namespace and name identify the
//! cluster, and the `<name>-kubeconfig` secret next to it grants access.

use crate::references::ClusterObjectReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Suffix of the secret holding a workload cluster's admin kubeconfig
pub const KUBECONFIG_SECRET_SUFFIX: &str = "-kubeconfig";

/// Key inside the kubeconfig secret's `data` map
pub const KUBECONFIG_SECRET_KEY: &str = "value";

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "cluster.x-k8s.io",
    version = "v1alpha3",
    kind = "Cluster",
    plural = "clusters",
    namespaced,
    status = "ClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Pauses reconciliation of the cluster and its children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,

    /// Network configuration of the cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_network: Option<ClusterNetwork>,

    /// Endpoint used to communicate with the control plane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<ApiEndpoint>,

    /// Provider-specific control plane object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_ref: Option<ClusterObjectReference>,

    /// Provider-specific infrastructure object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_ref: Option<ClusterObjectReference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetwork {
    /// Port the API server binds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server_port: Option<i32>,

    /// Domain name for services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_domain: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    /// Hostname or IP of the API server
    pub host: String,

    /// Port of the API server
    pub port: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// Current lifecycle phase (Pending, Provisioning, Provisioned, Deleting, Failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    #[serde(default)]
    pub infrastructure_ready: bool,

    #[serde(default)]
    pub control_plane_initialized: bool,

    #[serde(default)]
    pub control_plane_ready: bool,

    /// Terminal failure reason, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// Terminal failure message, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
}

impl Cluster {
    /// Name of the secret holding this cluster's kubeconfig
    pub fn kubeconfig_secret_name(&self) -> String {
        format!(
            "{}{}",
            self.metadata.name.as_deref().unwrap_or_default(),
            KUBECONFIG_SECRET_SUFFIX
        )
    }

    /// Whether the cluster's control plane has come up at least once
    pub fn is_provisioned(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|status| status.control_plane_initialized)
    }
}
