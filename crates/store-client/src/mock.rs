//! Mock StoreClient for unit testing
//!
//! This module provides an in-memory implementation of `StoreClient` that
//! behaves like an API server for the operations the helper uses: it honors
//! dry-run, reports `NotFound`/`AlreadyExists` the same way, applies JSON
//! merge patches, bumps `resourceVersion` on persisted writes and keeps list
//! results in insertion order.

use crate::error::StoreError;
use crate::resource::{ManagedResource, ObjectKey, WriteOptions, gvk_of};
use crate::store_trait::StoreClient;
use kube::api::{DynamicObject, GroupVersionKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Store operations, for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Get,
    List,
    Create,
    Patch,
    Delete,
}

/// Mock StoreClient for testing
///
/// Clones share the same backing store, so a test can keep a handle to
/// inspect state after handing a clone to the code under test.
#[derive(Clone)]
pub struct MockStoreClient {
    pub(crate) endpoint: String,
    // In-memory storage, in insertion order
    pub(crate) objects: Arc<Mutex<Vec<DynamicObject>>>,
    pub(crate) calls: Arc<Mutex<HashMap<MockOperation, usize>>>,
    pub(crate) failures: Arc<Mutex<HashMap<MockOperation, String>>>,
    pub(crate) latency: Arc<Mutex<Option<Duration>>>,
    // Counter for generating resource versions and uids
    pub(crate) next_version: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for MockStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStoreClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

fn same_kind(obj: &DynamicObject, gvk: &GroupVersionKind) -> bool {
    gvk_of(obj).is_ok_and(|candidate| candidate.group == gvk.group && candidate.kind == gvk.kind)
}

impl MockStoreClient {
    /// Create an empty mock store
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            objects: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            latency: Arc::new(Mutex::new(None)),
            next_version: Arc::new(Mutex::new(1)),
        }
    }

    /// Add an object to the mock store (for test setup)
    pub fn add_object<R: ManagedResource>(&self, resource: &R) {
        let mut obj = resource.to_dynamic().unwrap();
        self.stamp(&mut obj);
        self.objects.lock().unwrap().push(obj);
    }

    /// Remove every object of a kind (for test setup)
    pub fn clear_kind(&self, gvk: &GroupVersionKind) {
        self.objects.lock().unwrap().retain(|obj| !same_kind(obj, gvk));
    }

    /// Current stored version of an object, bypassing call counting
    pub fn object(&self, gvk: &GroupVersionKind, key: &ObjectKey) -> Option<DynamicObject> {
        let objects = self.objects.lock().unwrap();
        objects
            .iter()
            .find(|obj| same_kind(obj, gvk) && ObjectKey::from_meta(&obj.metadata) == *key)
            .cloned()
    }

    /// Make every call of `operation` fail with a store API error
    pub fn fail_on(&self, operation: MockOperation, message: &str) {
        self.failures.lock().unwrap().insert(operation, message.to_string());
    }

    /// Stop failing calls of `operation`
    pub fn clear_failure(&self, operation: MockOperation) {
        self.failures.lock().unwrap().remove(&operation);
    }

    /// Delay every call before it touches the store
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Number of calls received for `operation`, dry-run included
    pub fn calls(&self, operation: MockOperation) -> usize {
        self.calls.lock().unwrap().get(&operation).copied().unwrap_or(0)
    }

    /// Number of create/patch/delete calls received, dry-run included
    pub fn write_calls(&self) -> usize {
        self.calls(MockOperation::Create) + self.calls(MockOperation::Patch) + self.calls(MockOperation::Delete)
    }

    /// Set resourceVersion and uid the way the API server does on persistence
    fn stamp(&self, obj: &mut DynamicObject) {
        let mut next = self.next_version.lock().unwrap();
        obj.metadata.resource_version = Some(next.to_string());
        if obj.metadata.uid.is_none() {
            obj.metadata.uid = Some(format!("mock-uid-{}", *next));
        }
        *next += 1;
    }

    async fn enter(&self, operation: MockOperation) -> Result<(), StoreError> {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.failures.lock().unwrap().get(&operation) {
            Some(message) => Err(StoreError::Api(message.clone())),
            None => Ok(()),
        }
    }

    fn position(objects: &[DynamicObject], gvk: &GroupVersionKind, key: &ObjectKey) -> Option<usize> {
        objects
            .iter()
            .position(|obj| same_kind(obj, gvk) && ObjectKey::from_meta(&obj.metadata) == *key)
    }
}

#[async_trait::async_trait]
impl StoreClient for MockStoreClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get(&self, gvk: &GroupVersionKind, key: &ObjectKey) -> Result<DynamicObject, StoreError> {
        self.enter(MockOperation::Get).await?;
        self.object(gvk, key).ok_or_else(|| StoreError::NotFound {
            kind: gvk.kind.clone(),
            name: key.to_string(),
        })
    }

    async fn list(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>, StoreError> {
        self.enter(MockOperation::List).await?;
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .iter()
            .filter(|obj| same_kind(obj, gvk))
            .filter(|obj| namespace.is_none() || obj.metadata.namespace.as_deref() == namespace)
            .cloned()
            .collect())
    }

    async fn create(&self, obj: &DynamicObject, opts: &WriteOptions) -> Result<DynamicObject, StoreError> {
        self.enter(MockOperation::Create).await?;
        let gvk = gvk_of(obj)?;
        let key = ObjectKey::from_meta(&obj.metadata);
        let mut objects = self.objects.lock().unwrap();
        if Self::position(&objects, &gvk, &key).is_some() {
            return Err(StoreError::AlreadyExists {
                kind: gvk.kind,
                name: key.to_string(),
            });
        }

        let mut created = obj.clone();
        if opts.dry_run {
            return Ok(created);
        }
        self.stamp(&mut created);
        objects.push(created.clone());
        Ok(created)
    }

    async fn patch(
        &self,
        obj: &DynamicObject,
        patch: &serde_json::Value,
        opts: &WriteOptions,
    ) -> Result<DynamicObject, StoreError> {
        self.enter(MockOperation::Patch).await?;
        let gvk = gvk_of(obj)?;
        let key = ObjectKey::from_meta(&obj.metadata);
        let mut objects = self.objects.lock().unwrap();
        let index = Self::position(&objects, &gvk, &key).ok_or_else(|| StoreError::NotFound {
            kind: gvk.kind.clone(),
            name: key.to_string(),
        })?;

        let mut document = serde_json::to_value(&objects[index])?;
        json_patch::merge(&mut document, patch);
        let mut patched: DynamicObject = serde_json::from_value(document)?;
        if opts.dry_run {
            return Ok(patched);
        }
        self.stamp(&mut patched);
        objects[index] = patched.clone();
        Ok(patched)
    }

    async fn delete(&self, obj: &DynamicObject, opts: &WriteOptions) -> Result<(), StoreError> {
        self.enter(MockOperation::Delete).await?;
        let gvk = gvk_of(obj)?;
        let key = ObjectKey::from_meta(&obj.metadata);
        let mut objects = self.objects.lock().unwrap();
        let index = Self::position(&objects, &gvk, &key).ok_or_else(|| StoreError::NotFound {
            kind: gvk.kind.clone(),
            name: key.to_string(),
        })?;
        if !opts.dry_run {
            objects.remove(index);
        }
        Ok(())
    }
}
