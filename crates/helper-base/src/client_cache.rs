//! Lazily built, memoized store clients.
//!
//! One client for the management cluster and one per workload cluster. The
//! cache itself is plain data kept under the tool's lock; clients are built
//! outside the lock and installed afterwards, first install wins.

use crate::config::ToolConfig;
use crate::error::ToolError;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use crds::{KUBECONFIG_SECRET_KEY, KUBECONFIG_SECRET_SUFFIX};
use kube::api::GroupVersionKind;
use std::collections::HashMap;
use std::sync::Arc;
use store_client::{KubeStoreClient, ObjectKey, StoreClient};
use tracing::{debug, info};

/// Builds the store client for one workload cluster.
///
/// Tests substitute a fake; the default is [`RemoteClusterClientFactory`].
#[async_trait::async_trait]
pub trait WorkloadClientFactory: Send + Sync {
    /// Build a client for the workload cluster `cluster`, using `management`
    /// to look up whatever credentials it needs
    async fn workload_client(
        &self,
        management: Arc<dyn StoreClient>,
        cluster: &ObjectKey,
    ) -> Result<Arc<dyn StoreClient>, ToolError>;
}

/// Cluster API convention: the admin kubeconfig of cluster `<name>` lives in
/// secret `<name>-kubeconfig`, key `value`, next to the Cluster record.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoteClusterClientFactory;

#[async_trait::async_trait]
impl WorkloadClientFactory for RemoteClusterClientFactory {
    async fn workload_client(
        &self,
        management: Arc<dyn StoreClient>,
        cluster: &ObjectKey,
    ) -> Result<Arc<dyn StoreClient>, ToolError> {
        let secret_key = ObjectKey::new(
            cluster.namespace.as_deref(),
            &format!("{}{}", cluster.name, KUBECONFIG_SECRET_SUFFIX),
        );
        debug!("Reading kubeconfig secret {} for cluster {}", secret_key, cluster);

        let secret = management
            .get(&GroupVersionKind::gvk("", "v1", "Secret"), &secret_key)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ToolError::ClusterLookup(cluster.to_string(), e.to_string())
                } else {
                    ToolError::Store(e)
                }
            })?;

        let encoded = secret
            .data
            .get("data")
            .and_then(|data| data.get(KUBECONFIG_SECRET_KEY))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                ToolError::ClusterLookup(
                    cluster.to_string(),
                    format!("secret {} has no {:?} key", secret_key, KUBECONFIG_SECRET_KEY),
                )
            })?;
        let kubeconfig = BASE64_STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| {
                ToolError::ClusterLookup(
                    cluster.to_string(),
                    format!("secret {} does not hold a valid kubeconfig", secret_key),
                )
            })?;

        let client = KubeStoreClient::from_kubeconfig_yaml(&kubeconfig)
            .await
            .map_err(|source| ToolError::Connection {
                cluster: cluster.to_string(),
                source,
            })?;
        info!("Connected to workload cluster {} at {}", cluster, client.endpoint());
        Ok(Arc::new(client))
    }
}

/// Build the management cluster client from the configuration
pub(crate) async fn connect_management(config: &ToolConfig) -> Result<Arc<dyn StoreClient>, ToolError> {
    if let Some(client) = &config.management_client {
        return Ok(Arc::clone(client));
    }

    let connection_error = |source| ToolError::Connection {
        cluster: "management".to_string(),
        source,
    };
    let kube_config = match &config.kube_config {
        Some(kube_config) => kube_config.clone(),
        None => KubeStoreClient::load_config(config.kubeconfig.as_deref(), config.context.as_deref())
            .await
            .map_err(connection_error)?,
    };
    let client = KubeStoreClient::try_from_config(kube_config).map_err(connection_error)?;
    info!("Connected to management cluster at {}", client.endpoint());
    Ok(Arc::new(client))
}

/// Memoized clients, keyed by cluster identity (`namespace/name`)
#[derive(Default)]
pub(crate) struct ClientCache {
    management: Option<Arc<dyn StoreClient>>,
    workloads: HashMap<String, Arc<dyn StoreClient>>,
}

impl ClientCache {
    pub(crate) fn management(&self) -> Option<Arc<dyn StoreClient>> {
        self.management.clone()
    }

    /// Install the management client unless another caller got there first;
    /// returns the client everyone should use
    pub(crate) fn install_management(&mut self, client: Arc<dyn StoreClient>) -> Arc<dyn StoreClient> {
        Arc::clone(self.management.get_or_insert(client))
    }

    pub(crate) fn workload(&self, cluster: &str) -> Option<Arc<dyn StoreClient>> {
        self.workloads.get(cluster).cloned()
    }

    /// Install a workload client unless another caller got there first;
    /// returns the client everyone should use
    pub(crate) fn install_workload(&mut self, cluster: String, client: Arc<dyn StoreClient>) -> Arc<dyn StoreClient> {
        Arc::clone(self.workloads.entry(cluster).or_insert(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::secret;
    use store_client::MockStoreClient;

    #[test]
    fn test_first_installed_client_wins() {
        let mut cache = ClientCache::default();
        let first: Arc<dyn StoreClient> = Arc::new(MockStoreClient::new("mock://first"));
        let second: Arc<dyn StoreClient> = Arc::new(MockStoreClient::new("mock://second"));

        let installed = cache.install_workload("fleet/edge-1".to_string(), Arc::clone(&first));
        assert!(Arc::ptr_eq(&installed, &first));

        let raced = cache.install_workload("fleet/edge-1".to_string(), second);
        assert!(Arc::ptr_eq(&raced, &first));
        assert!(cache.workload("fleet/edge-2").is_none());
    }

    #[test]
    fn test_management_install_is_sticky() {
        let mut cache = ClientCache::default();
        assert!(cache.management().is_none());

        let first: Arc<dyn StoreClient> = Arc::new(MockStoreClient::new("mock://management"));
        cache.install_management(Arc::clone(&first));
        let raced = cache.install_management(Arc::new(MockStoreClient::new("mock://other")));
        assert_eq!(raced.endpoint(), "mock://management");
    }

    #[tokio::test]
    async fn test_remote_factory_missing_secret_is_lookup_failure() {
        let management = MockStoreClient::new("mock://management");
        let err = RemoteClusterClientFactory
            .workload_client(Arc::new(management), &ObjectKey::namespaced("fleet", "edge-1"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ToolError::ClusterLookup(cluster, _) if cluster == "fleet/edge-1"));
    }

    #[tokio::test]
    async fn test_remote_factory_rejects_secret_without_kubeconfig() {
        let management = MockStoreClient::new("mock://management");
        management.add_object(&secret("fleet", "edge-1-kubeconfig", &[("token", "abc")]));

        let err = RemoteClusterClientFactory
            .workload_client(Arc::new(management), &ObjectKey::namespaced("fleet", "edge-1"))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("has no \"value\" key"));
    }

    #[tokio::test]
    async fn test_prebuilt_management_client_is_used_as_is() {
        let management: Arc<dyn StoreClient> = Arc::new(MockStoreClient::new("mock://management"));
        let config = ToolConfig {
            management_client: Some(Arc::clone(&management)),
            ..Default::default()
        };
        let connected = connect_management(&config).await.unwrap();
        assert!(Arc::ptr_eq(&connected, &management));
    }
}
