//! Tool configuration.

use crate::client_cache::WorkloadClientFactory;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use store_client::StoreClient;

/// Configuration for a [`crate::Tool`].
///
/// The management connection is resolved from the first field that is set:
/// `management_client`, `kube_config`, then `kubeconfig`/`context`, then the
/// default kube discovery chain.
#[derive(Clone, Default)]
pub struct ToolConfig {
    /// Explicit kubeconfig path for the management cluster
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context override for the management cluster
    pub context: Option<String>,

    /// Pre-resolved client configuration for the management cluster
    pub kube_config: Option<kube::Config>,

    /// Pre-built management store client (tests, embedding callers)
    pub management_client: Option<Arc<dyn StoreClient>>,

    /// Namespace resources are deployed into when a manifest does not name one
    pub target_namespace: String,

    /// Namespace the cluster directory is restricted to; empty means all
    pub watching_namespace: String,

    /// Override for building workload cluster clients
    pub workload_client_factory: Option<Arc<dyn WorkloadClientFactory>>,

    /// Simulate writes without persisting them
    pub dry_run: bool,
}

impl fmt::Debug for ToolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolConfig")
            .field("kubeconfig", &self.kubeconfig)
            .field("context", &self.context)
            .field("kube_config", &self.kube_config.as_ref().map(|c| c.cluster_url.to_string()))
            .field(
                "management_client",
                &self.management_client.as_ref().map(|c| c.endpoint().to_string()),
            )
            .field("target_namespace", &self.target_namespace)
            .field("watching_namespace", &self.watching_namespace)
            .field("workload_client_factory", &self.workload_client_factory.is_some())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}
