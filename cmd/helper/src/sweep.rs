//! Fleet-wide sweep: one task per workload cluster, then a report.

use crate::error::DriverError;
use crds::Cluster;
use helper_base::{Tool, cluster_key};
use std::io::{self, Write};
use std::sync::Arc;
use store_client::{ManagedResource, Unstructured};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Apply `manifests` to every cluster in the tool's directory
///
/// A cluster stops at its first failure, which is recorded on the tool; the
/// other clusters carry on. Returns the clusters that were swept.
pub async fn sweep(
    tool: Arc<Tool>,
    manifests: Arc<Vec<Unstructured>>,
    cancel: CancellationToken,
) -> Result<Arc<Vec<Cluster>>, DriverError> {
    let clusters = tool.get_clusters(&cancel).await?;
    info!(
        "Applying {} manifests to {} clusters{}",
        manifests.len(),
        clusters.len(),
        if tool.dry_run() { " (dry run)" } else { "" }
    );

    let tasks: Vec<_> = clusters
        .iter()
        .cloned()
        .map(|cluster| {
            let tool = Arc::clone(&tool);
            let manifests = Arc::clone(&manifests);
            let cancel = cancel.clone();
            tokio::spawn(async move { apply_to_cluster(&tool, &cluster, &manifests, &cancel).await })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        if let Err(e) = result {
            error!("Cluster task aborted: {}", e);
        }
    }
    Ok(clusters)
}

async fn apply_to_cluster(tool: &Tool, cluster: &Cluster, manifests: &[Unstructured], cancel: &CancellationToken) {
    let id = cluster_key(cluster);
    if !cluster.is_provisioned() {
        warn!("Cluster {} has not reported an initialized control plane", id);
    }
    for manifest in manifests {
        if let Err(e) = tool.workload_create_or_patch(cancel, cluster, manifest).await {
            let what = format!("{} {}", manifest.gvk().kind, manifest.key());
            warn!("Cluster {} failed applying {}: {}", id, what, e);
            tool.record_error(cluster, anyhow::Error::new(e).context(format!("failed to apply {}", what)));
            return;
        }
    }
    info!("Cluster {} done", id);
}

/// Write every cluster's output and error to `out`; returns the number of
/// failed clusters
pub fn report(tool: &Tool, clusters: &[Cluster], out: &mut impl Write) -> io::Result<usize> {
    let mut failed = 0;
    for cluster in clusters {
        writeln!(out, "=== {} ===", cluster_key(cluster))?;
        write!(out, "{}", tool.output_for(cluster))?;
        if let Some(err) = tool.error_for(cluster) {
            failed += 1;
            writeln!(out, "❌ {:#}", err)?;
        }
    }
    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helper_base::{ToolConfig, ToolError, WorkloadClientFactory};
    use kube::api::{GroupVersionKind, ObjectMeta};
    use std::collections::HashMap;
    use store_client::{MockOperation, MockStoreClient, ObjectKey, StoreClient};

    struct StaticFactory {
        stores: HashMap<ObjectKey, MockStoreClient>,
    }

    #[async_trait::async_trait]
    impl WorkloadClientFactory for StaticFactory {
        async fn workload_client(
            &self,
            _management: Arc<dyn StoreClient>,
            cluster: &ObjectKey,
        ) -> Result<Arc<dyn StoreClient>, ToolError> {
            Ok(Arc::new(self.stores[cluster].clone()))
        }
    }

    fn cluster(name: &str) -> Cluster {
        Cluster {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("fleet".to_string()),
                ..Default::default()
            },
            spec: Default::default(),
            status: None,
        }
    }

    fn manifest(name: &str) -> Unstructured {
        Unstructured::new(&GroupVersionKind::gvk("", "v1", "ConfigMap"), name)
            .within("kube-system")
            .with_payload(serde_json::json!({ "data": { "color": "red" } }))
    }

    #[tokio::test]
    async fn test_sweep_records_failures_per_cluster() {
        let management = MockStoreClient::new("mock://management");
        let healthy = MockStoreClient::new("mock://healthy");
        let broken = MockStoreClient::new("mock://broken");
        broken.fail_on(MockOperation::Create, "admission webhook denied the request");
        management.add_object(&cluster("healthy"));
        management.add_object(&cluster("broken"));

        let factory = StaticFactory {
            stores: HashMap::from([
                (ObjectKey::namespaced("fleet", "healthy"), healthy.clone()),
                (ObjectKey::namespaced("fleet", "broken"), broken.clone()),
            ]),
        };
        let tool = Arc::new(Tool::new(ToolConfig {
            management_client: Some(Arc::new(management)),
            workload_client_factory: Some(Arc::new(factory)),
            ..Default::default()
        }));

        let manifests = Arc::new(vec![manifest("first"), manifest("second")]);
        let clusters = sweep(Arc::clone(&tool), manifests, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(clusters.len(), 2);

        let mut out = Vec::new();
        let failed = report(&tool, &clusters, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(failed, 1);
        assert!(out.contains(
            "=== fleet/healthy ===\n\
             ✅ ConfigMap kube-system/first has been successfully created\n\
             ✅ ConfigMap kube-system/second has been successfully created\n"
        ));
        assert!(out.contains("=== fleet/broken ===\n❌ failed to apply ConfigMap kube-system/first: "));
        assert!(out.contains("admission webhook denied the request"));
        assert_eq!(healthy.write_calls(), 2);
        // The broken cluster stopped at its first failure
        assert_eq!(broken.calls(MockOperation::Create), 1);
    }

    #[tokio::test]
    async fn test_sweep_without_clusters_reports_nothing() {
        let tool = Arc::new(Tool::new(ToolConfig {
            management_client: Some(Arc::new(MockStoreClient::new("mock://management"))),
            ..Default::default()
        }));
        let clusters = sweep(Arc::clone(&tool), Arc::new(vec![manifest("first")]), CancellationToken::new())
            .await
            .unwrap();

        let mut out = Vec::new();
        assert_eq!(report(&tool, &clusters, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }
}
