//! Cluster directory: the workload clusters registered in the management cluster.

use crate::cancel::cancellable;
use crate::error::ToolError;
use crds::Cluster;
use store_client::{ManagedResource, StoreClient, gvk_for};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// List `Cluster` records in `watching_namespace` (all namespaces when empty),
/// in the order the store returns them
pub(crate) async fn list_clusters(
    cancel: &CancellationToken,
    management: &dyn StoreClient,
    watching_namespace: &str,
) -> Result<Vec<Cluster>, ToolError> {
    let namespace = Some(watching_namespace).filter(|ns| !ns.is_empty());
    debug!(
        "Listing clusters in {}",
        namespace.unwrap_or("all namespaces")
    );

    let objects = match cancellable(cancel, management.list(&gvk_for::<Cluster>(), namespace)).await {
        Ok(objects) => objects,
        Err(ToolError::Store(e)) => return Err(ToolError::ClusterList(e)),
        Err(e) => return Err(e),
    };

    let clusters = objects
        .into_iter()
        .map(Cluster::from_dynamic)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ToolError::ClusterList)?;
    info!("Found {} workload clusters", clusters.len());
    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::generate_cluster;
    use store_client::{MockOperation, MockStoreClient};

    fn names(clusters: &[Cluster]) -> Vec<String> {
        clusters
            .iter()
            .filter_map(|cluster| cluster.metadata.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_list_all_namespaces() {
        let management = MockStoreClient::new("mock://management");
        management.add_object(&generate_cluster("fleet", "edge-1"));
        management.add_object(&generate_cluster("staging", "edge-2"));

        let clusters = list_clusters(&CancellationToken::new(), &management, "")
            .await
            .unwrap();
        assert_eq!(names(&clusters), vec!["edge-1", "edge-2"]);
    }

    #[tokio::test]
    async fn test_list_filters_watching_namespace() {
        let management = MockStoreClient::new("mock://management");
        management.add_object(&generate_cluster("fleet", "edge-3"));
        management.add_object(&generate_cluster("staging", "edge-2"));
        management.add_object(&generate_cluster("fleet", "edge-1"));

        let clusters = list_clusters(&CancellationToken::new(), &management, "fleet")
            .await
            .unwrap();
        assert_eq!(names(&clusters), vec!["edge-3", "edge-1"]);
    }

    #[tokio::test]
    async fn test_list_failure_is_cluster_list_error() {
        let management = MockStoreClient::new("mock://management");
        management.fail_on(MockOperation::List, "forbidden");

        let err = list_clusters(&CancellationToken::new(), &management, "")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ClusterList(_)));
        assert!(err.to_string().starts_with("failed to list workload clusters"));
    }
}
