//! The Tool: one handle over configuration, client cache, cluster directory
//! and per-cluster output.
//!
//! All mutable state sits behind a single lock. The lock only guards map and
//! field updates; every store round trip runs without it and writes its result
//! back under a fresh acquisition.

use crate::apply::{Applier, ApplyOutcome};
use crate::cancel::cancellable;
use crate::client_cache::{ClientCache, RemoteClusterClientFactory, WorkloadClientFactory, connect_management};
use crate::config::ToolConfig;
use crate::directory::list_clusters;
use crate::error::ToolError;
use crate::output::{OutputAggregator, OutputBuffer};
use crds::Cluster;
use kube::api::GroupVersionKind;
use parking_lot::Mutex;
use std::sync::Arc;
use store_client::{ManagedResource, ObjectKey, StoreClient};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Identity of a workload cluster: the namespace/name of its Cluster record
pub fn cluster_key(cluster: &Cluster) -> ObjectKey {
    ObjectKey::from_meta(&cluster.metadata)
}

#[derive(Default)]
struct ToolState {
    config: Arc<ToolConfig>,
    clients: ClientCache,
    clusters: Option<Arc<Vec<Cluster>>>,
    output: OutputAggregator,
}

/// Fleet-wide create/patch/delete helper
///
/// Safe to share between tasks (`Arc<Tool>`); one task per cluster is the
/// intended use.
#[derive(Default)]
pub struct Tool {
    state: Mutex<ToolState>,
}

impl Tool {
    /// Create a tool with the given configuration
    pub fn new(config: ToolConfig) -> Self {
        let tool = Self::default();
        tool.configure(config);
        tool
    }

    /// Replace the configuration
    ///
    /// Clients and the cluster directory already built are kept; configure
    /// before the first operation.
    pub fn configure(&self, config: ToolConfig) {
        debug!("Configuring tool: {:?}", config);
        self.state.lock().config = Arc::new(config);
    }

    /// Whether writes are simulated
    pub fn dry_run(&self) -> bool {
        self.state.lock().config.dry_run
    }

    /// Namespace resources are deployed into by default
    pub fn target_namespace(&self) -> String {
        self.state.lock().config.target_namespace.clone()
    }

    /// Namespace the cluster directory is restricted to; empty means all
    pub fn watching_namespace(&self) -> String {
        self.state.lock().config.watching_namespace.clone()
    }

    /// Client for the management cluster, connected on first use
    pub async fn management_client(&self, cancel: &CancellationToken) -> Result<Arc<dyn StoreClient>, ToolError> {
        let config = {
            let state = self.state.lock();
            if let Some(client) = state.clients.management() {
                return Ok(client);
            }
            Arc::clone(&state.config)
        };

        let client = cancellable(cancel, connect_management(&config)).await?;
        Ok(self.state.lock().clients.install_management(client))
    }

    /// Client for a workload cluster, built through the configured factory on
    /// first use
    pub async fn workload_client(
        &self,
        cancel: &CancellationToken,
        cluster: &Cluster,
    ) -> Result<Arc<dyn StoreClient>, ToolError> {
        let key = cluster_key(cluster);
        let id = key.to_string();
        let factory = {
            let state = self.state.lock();
            if let Some(client) = state.clients.workload(&id) {
                return Ok(client);
            }
            state.config.workload_client_factory.clone()
        };
        let factory: Arc<dyn WorkloadClientFactory> = factory.unwrap_or_else(|| Arc::new(RemoteClusterClientFactory));

        let management = self.management_client(cancel).await?;
        debug!("Building client for workload cluster {}", id);
        let client = cancellable(cancel, factory.workload_client(management, &key)).await?;
        Ok(self.state.lock().clients.install_workload(id, client))
    }

    /// Workload clusters in the watching namespace, listed once per Tool
    pub async fn get_clusters(&self, cancel: &CancellationToken) -> Result<Arc<Vec<Cluster>>, ToolError> {
        let watching_namespace = {
            let state = self.state.lock();
            if let Some(clusters) = &state.clusters {
                return Ok(Arc::clone(clusters));
            }
            state.config.watching_namespace.clone()
        };

        let management = self.management_client(cancel).await?;
        let clusters = Arc::new(list_clusters(cancel, management.as_ref(), &watching_namespace).await?);
        Ok(Arc::clone(self.state.lock().clusters.get_or_insert(clusters)))
    }

    /// Read one object from the management cluster
    pub async fn management_get<R: ManagedResource>(
        &self,
        cancel: &CancellationToken,
        gvk: &GroupVersionKind,
        key: &ObjectKey,
    ) -> Result<R, ToolError> {
        let client = self.management_client(cancel).await?;
        let obj = cancellable(cancel, client.get(gvk, key)).await?;
        Ok(R::from_dynamic(obj)?)
    }

    /// Read one object from a workload cluster
    pub async fn workload_get<R: ManagedResource>(
        &self,
        cancel: &CancellationToken,
        cluster: &Cluster,
        gvk: &GroupVersionKind,
        key: &ObjectKey,
    ) -> Result<R, ToolError> {
        let client = self.workload_client(cancel, cluster).await?;
        let obj = cancellable(cancel, client.get(gvk, key)).await?;
        Ok(R::from_dynamic(obj)?)
    }

    /// List objects of a kind in a workload cluster; `None` lists every namespace
    pub async fn workload_list<R: ManagedResource>(
        &self,
        cancel: &CancellationToken,
        cluster: &Cluster,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<Vec<R>, ToolError> {
        let client = self.workload_client(cancel, cluster).await?;
        let objects = cancellable(cancel, client.list(gvk, namespace)).await?;
        objects
            .into_iter()
            .map(|obj| R::from_dynamic(obj).map_err(ToolError::from))
            .collect()
    }

    /// Create `resource` in the workload cluster
    pub async fn workload_create<R: ManagedResource>(
        &self,
        cancel: &CancellationToken,
        cluster: &Cluster,
        resource: &R,
    ) -> Result<R, ToolError> {
        let client = self.workload_client(cancel, cluster).await?;
        let obj = resource.to_dynamic()?;
        let applied = self.applier(cancel, client.as_ref()).create(&obj).await?;
        self.append(cluster, &applied.line);
        Ok(R::from_dynamic(applied.value)?)
    }

    /// Apply a JSON merge patch to `resource` as stored in the workload cluster
    pub async fn workload_patch<R: ManagedResource>(
        &self,
        cancel: &CancellationToken,
        cluster: &Cluster,
        resource: &R,
        patch: &serde_json::Value,
    ) -> Result<R, ToolError> {
        let client = self.workload_client(cancel, cluster).await?;
        let obj = resource.to_dynamic()?;
        let applied = self.applier(cancel, client.as_ref()).patch(&obj, patch).await?;
        self.append(cluster, &applied.line);
        Ok(R::from_dynamic(applied.value)?)
    }

    /// Delete `resource` from the workload cluster
    pub async fn workload_delete<R: ManagedResource>(
        &self,
        cancel: &CancellationToken,
        cluster: &Cluster,
        resource: &R,
    ) -> Result<(), ToolError> {
        let client = self.workload_client(cancel, cluster).await?;
        let obj = resource.to_dynamic()?;
        let applied = self.applier(cancel, client.as_ref()).delete(&obj).await?;
        self.append(cluster, &applied.line);
        Ok(applied.value)
    }

    /// Create `resource` in the workload cluster, or patch it when the stored
    /// copy differs; no write at all when it is already up-to-date
    pub async fn workload_create_or_patch<R: ManagedResource>(
        &self,
        cancel: &CancellationToken,
        cluster: &Cluster,
        resource: &R,
    ) -> Result<ApplyOutcome, ToolError> {
        let client = self.workload_client(cancel, cluster).await?;
        let obj = resource.to_dynamic()?;
        let applied = self.applier(cancel, client.as_ref()).create_or_patch(&obj).await?;
        self.append(cluster, &applied.line);
        Ok(applied.value)
    }

    fn applier<'a>(&self, cancel: &'a CancellationToken, store: &'a dyn StoreClient) -> Applier<'a> {
        Applier {
            store,
            dry_run: self.dry_run(),
            cancel,
        }
    }

    fn append(&self, cluster: &Cluster, line: &str) {
        debug!("{}: {}", cluster_key(cluster), line);
        self.buffer_for(cluster).append_line(line);
    }

    /// Record an error for the cluster; the latest one recorded is kept
    pub fn record_error(&self, cluster: &Cluster, err: impl Into<anyhow::Error>) {
        let id = cluster_key(cluster).to_string();
        self.state.lock().output.record_error(&id, err.into());
    }

    /// The error recorded for the cluster, if any
    pub fn error_for(&self, cluster: &Cluster) -> Option<Arc<anyhow::Error>> {
        let id = cluster_key(cluster).to_string();
        self.state.lock().output.error_for(&id)
    }

    /// Whether an error was recorded for the cluster
    pub fn has_error(&self, cluster: &Cluster) -> bool {
        self.error_for(cluster).is_some()
    }

    /// Everything written for the cluster so far
    pub fn output_for(&self, cluster: &Cluster) -> String {
        let id = cluster_key(cluster).to_string();
        self.state.lock().output.output_for(&id)
    }

    /// The cluster's output stream, for callers adding their own lines
    pub fn buffer_for(&self, cluster: &Cluster) -> OutputBuffer {
        let id = cluster_key(cluster).to_string();
        self.state.lock().output.buffer_for(&id)
    }
}
