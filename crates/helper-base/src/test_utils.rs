//! Test utilities for unit testing the tool
//!
//! Builders for test resources plus a fake workload client factory that hands
//! out one in-memory store per cluster and counts how often it was asked.

use crate::client_cache::WorkloadClientFactory;
use crate::config::ToolConfig;
use crate::error::ToolError;
use crate::tool::Tool;
use crds::{Cluster, ClusterSpec};
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use store_client::{MockStoreClient, ObjectKey, StoreClient};

/// Helper to create a test Secret with plain-text data values
pub fn secret(namespace: &str, name: &str, data: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(
            data.iter()
                .map(|(key, value)| (key.to_string(), ByteString(value.as_bytes().to_vec())))
                .collect::<BTreeMap<_, _>>(),
        ),
        ..Default::default()
    }
}

/// Helper to create a test Cluster record
pub fn generate_cluster(namespace: &str, name: &str) -> Cluster {
    Cluster {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: ClusterSpec::default(),
        status: None,
    }
}

/// Workload client factory backed by one `MockStoreClient` per cluster
#[derive(Default)]
pub struct MockClusterFactory {
    stores: Mutex<HashMap<ObjectKey, MockStoreClient>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockClusterFactory {
    /// Factory that sleeps before every client it builds, to widen races
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    /// The store behind a cluster's client, for setup and inspection
    pub fn store(&self, cluster: &Cluster) -> MockStoreClient {
        let key = ObjectKey::from_meta(&cluster.metadata);
        self.stores
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_insert_with(|| MockStoreClient::new(format!("mock://{}", key)))
            .clone()
    }

    /// Number of clients built so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl WorkloadClientFactory for MockClusterFactory {
    async fn workload_client(
        &self,
        _management: Arc<dyn StoreClient>,
        cluster: &ObjectKey,
    ) -> Result<Arc<dyn StoreClient>, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let store = self
            .stores
            .lock()
            .unwrap()
            .entry(cluster.clone())
            .or_insert_with(|| MockStoreClient::new(format!("mock://{}", cluster)))
            .clone();
        Ok(Arc::new(store))
    }
}

/// Helper to create a tool wired to mock management and workload stores
pub fn create_test_tool(management: &MockStoreClient, factory: Arc<MockClusterFactory>, dry_run: bool) -> Tool {
    Tool::new(ToolConfig {
        management_client: Some(Arc::new(management.clone())),
        workload_client_factory: Some(factory),
        dry_run,
        ..Default::default()
    })
}
