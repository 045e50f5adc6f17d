//! StoreClient trait for mocking
//!
//! This trait abstracts the object store so the helper can run against a real
//! API server (`KubeStoreClient`) or an in-memory fake in tests.

use crate::error::StoreError;
use crate::resource::{ObjectKey, WriteOptions};
use kube::api::{DynamicObject, GroupVersionKind};

/// Object store operations against one cluster
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
/// Objects passed to `create`, `patch` and `delete` must carry their
/// `apiVersion` and `kind`.
#[async_trait::async_trait]
pub trait StoreClient: Send + Sync {
    /// Human-readable identity of the store (API server URL or fake name)
    fn endpoint(&self) -> &str;

    /// Fetch one object by key
    async fn get(&self, gvk: &GroupVersionKind, key: &ObjectKey) -> Result<DynamicObject, StoreError>;

    /// List objects of a kind, in one namespace or across all of them (`None`)
    async fn list(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>, StoreError>;

    /// Create an object, returning the stored (or would-be stored) version
    async fn create(&self, obj: &DynamicObject, opts: &WriteOptions) -> Result<DynamicObject, StoreError>;

    /// Apply a JSON merge patch to the object addressed by `obj`
    async fn patch(
        &self,
        obj: &DynamicObject,
        patch: &serde_json::Value,
        opts: &WriteOptions,
    ) -> Result<DynamicObject, StoreError>;

    /// Delete the object addressed by `obj`
    async fn delete(&self, obj: &DynamicObject, opts: &WriteOptions) -> Result<(), StoreError>;
}
