//! Integration tests for the kube-backed store client
//!
//! These tests require a reachable Kubernetes API server.
//! Set KUBECONFIG (and optionally KUBE_CONTEXT) to run; they use the
//! `default` namespace.

use kube::api::GroupVersionKind;
use std::path::PathBuf;
use store_client::{KubeStoreClient, ObjectKey, StoreClient, Unstructured, WriteOptions};

async fn client() -> KubeStoreClient {
    let kubeconfig = std::env::var("KUBECONFIG").ok().map(PathBuf::from);
    let context = std::env::var("KUBE_CONTEXT").ok();
    let config = KubeStoreClient::load_config(kubeconfig.as_deref(), context.as_deref())
        .await
        .expect("Failed to load kubeconfig");
    KubeStoreClient::try_from_config(config).expect("Failed to create client")
}

fn config_map(name: &str) -> Unstructured {
    Unstructured::new(&GroupVersionKind::gvk("", "v1", "ConfigMap"), name)
        .within("default")
        .with_payload(serde_json::json!({ "data": { "color": "red" } }))
}

#[tokio::test]
#[ignore] // Requires running Kubernetes API server
async fn test_list_namespaces() {
    let client = client().await;
    let namespaces = client
        .list(&GroupVersionKind::gvk("", "v1", "Namespace"), None)
        .await
        .expect("Failed to list namespaces");

    println!("Found {} namespaces at {}", namespaces.len(), client.endpoint());
    assert!(
        namespaces
            .iter()
            .any(|ns| ns.metadata.name.as_deref() == Some("default"))
    );
}

#[tokio::test]
#[ignore]
async fn test_get_missing_is_not_found() {
    let client = client().await;
    let err = client
        .get(
            &GroupVersionKind::gvk("", "v1", "ConfigMap"),
            &ObjectKey::namespaced("default", "fleet-helper-does-not-exist"),
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);
}

#[tokio::test]
#[ignore]
async fn test_dry_run_create_does_not_persist() {
    let client = client().await;
    let obj = config_map("fleet-helper-dry-run").into_dynamic();

    client
        .create(&obj, &WriteOptions::dry_run())
        .await
        .expect("Dry-run create failed");

    let err = client
        .get(
            &GroupVersionKind::gvk("", "v1", "ConfigMap"),
            &ObjectKey::namespaced("default", "fleet-helper-dry-run"),
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore]
async fn test_create_patch_delete() {
    let client = client().await;
    let obj = config_map("fleet-helper-lifecycle").into_dynamic();

    client
        .create(&obj, &WriteOptions::default())
        .await
        .expect("Failed to create");
    let duplicate = client.create(&obj, &WriteOptions::default()).await.unwrap_err();
    assert!(duplicate.is_already_exists());

    let patch = serde_json::json!({ "data": { "color": "blue" } });
    let patched = client
        .patch(&obj, &patch, &WriteOptions::default())
        .await
        .expect("Failed to patch");
    assert_eq!(patched.data["data"]["color"], "blue");

    client
        .delete(&obj, &WriteOptions::default())
        .await
        .expect("Failed to delete");
}
