//! Kubernetes-backed object store client
//!
//! Implements `StoreClient` over a `kube::Client`, addressing arbitrary kinds
//! through `ApiResource`s derived from their group-version-kind.

use crate::error::StoreError;
use crate::resource::{ObjectKey, WriteOptions, gvk_of};
use crate::store_trait::StoreClient;
use kube::api::{
    Api, ApiResource, DeleteParams, DynamicObject, GroupVersionKind, ListParams, Patch,
    PatchParams, PostParams,
};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;
use tracing::debug;

/// Object store client backed by a Kubernetes API server
#[derive(Clone)]
pub struct KubeStoreClient {
    client: Client,
    endpoint: String,
}

impl std::fmt::Debug for KubeStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStoreClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl KubeStoreClient {
    /// Create a store client from a resolved client configuration
    pub fn try_from_config(config: Config) -> Result<Self, StoreError> {
        let endpoint = config.cluster_url.to_string();
        let client = Client::try_from(config)
            .map_err(|e| StoreError::Connection(format!("failed to create client: {}", e)))?;
        Ok(Self { client, endpoint })
    }

    /// Create a store client using the default credential discovery chain
    /// (`KUBECONFIG`, `~/.kube/config`, then in-cluster service account)
    pub async fn try_default() -> Result<Self, StoreError> {
        let config = Config::infer()
            .await
            .map_err(|e| StoreError::Connection(format!("failed to infer config: {}", e)))?;
        Self::try_from_config(config)
    }

    /// Resolve a client configuration from an optional kubeconfig path and context
    ///
    /// Without a path the default kubeconfig loading rules apply; without a
    /// context the kubeconfig's current context is used.
    pub async fn load_config(
        kubeconfig: Option<&Path>,
        context: Option<&str>,
    ) -> Result<Config, StoreError> {
        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            ..Default::default()
        };
        match (kubeconfig, context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    StoreError::Connection(format!(
                        "failed to read kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| StoreError::Connection(format!("failed to load kubeconfig: {}", e)))
            }
            (None, Some(_)) => Config::from_kubeconfig(&options)
                .await
                .map_err(|e| StoreError::Connection(format!("failed to load kubeconfig: {}", e))),
            (None, None) => Config::infer()
                .await
                .map_err(|e| StoreError::Connection(format!("failed to infer config: {}", e))),
        }
    }

    /// Create a store client from kubeconfig YAML (e.g. a Cluster API kubeconfig secret)
    pub async fn from_kubeconfig_yaml(yaml: &str) -> Result<Self, StoreError> {
        let kubeconfig = Kubeconfig::from_yaml(yaml)
            .map_err(|e| StoreError::Connection(format!("failed to parse kubeconfig: {}", e)))?;
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| StoreError::Connection(format!("failed to load kubeconfig: {}", e)))?;
        Self::try_from_config(config)
    }

    fn api(&self, resource: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::all_with(self.client.clone(), resource),
        }
    }

    fn api_for(&self, obj: &DynamicObject) -> Result<(Api<DynamicObject>, GroupVersionKind, ObjectKey), StoreError> {
        let gvk = gvk_of(obj)?;
        let key = ObjectKey::from_meta(&obj.metadata);
        if key.name.is_empty() {
            return Err(StoreError::InvalidObject(format!("{} has no name", gvk.kind)));
        }
        let resource = ApiResource::from_gvk(&gvk);
        Ok((self.api(&resource, key.namespace.as_deref()), gvk, key))
    }
}

#[async_trait::async_trait]
impl StoreClient for KubeStoreClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get(&self, gvk: &GroupVersionKind, key: &ObjectKey) -> Result<DynamicObject, StoreError> {
        debug!("GET {} {} from {}", gvk.kind, key, self.endpoint);
        let resource = ApiResource::from_gvk(gvk);
        self.api(&resource, key.namespace.as_deref())
            .get(&key.name)
            .await
            .map_err(|e| StoreError::from_kube(e, &gvk.kind, &key.to_string()))
    }

    async fn list(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>, StoreError> {
        debug!(
            "LIST {} in {} from {}",
            gvk.kind,
            namespace.unwrap_or("all namespaces"),
            self.endpoint
        );
        let resource = ApiResource::from_gvk(gvk);
        let list = self
            .api(&resource, namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| StoreError::from_kube(e, &gvk.kind, namespace.unwrap_or_default()))?;
        Ok(list.items)
    }

    async fn create(&self, obj: &DynamicObject, opts: &WriteOptions) -> Result<DynamicObject, StoreError> {
        let (api, gvk, key) = self.api_for(obj)?;
        debug!("CREATE {} {} on {} (dry run: {})", gvk.kind, key, self.endpoint, opts.dry_run);
        let params = PostParams {
            dry_run: opts.dry_run,
            ..Default::default()
        };
        api.create(&params, obj)
            .await
            .map_err(|e| StoreError::from_kube(e, &gvk.kind, &key.to_string()))
    }

    async fn patch(
        &self,
        obj: &DynamicObject,
        patch: &serde_json::Value,
        opts: &WriteOptions,
    ) -> Result<DynamicObject, StoreError> {
        let (api, gvk, key) = self.api_for(obj)?;
        debug!("PATCH {} {} on {} (dry run: {})", gvk.kind, key, self.endpoint, opts.dry_run);
        let mut params = PatchParams::default();
        if opts.dry_run {
            params = params.dry_run();
        }
        api.patch(&key.name, &params, &Patch::Merge(patch))
            .await
            .map_err(|e| StoreError::from_kube(e, &gvk.kind, &key.to_string()))
    }

    async fn delete(&self, obj: &DynamicObject, opts: &WriteOptions) -> Result<(), StoreError> {
        let (api, gvk, key) = self.api_for(obj)?;
        debug!("DELETE {} {} on {} (dry run: {})", gvk.kind, key, self.endpoint, opts.dry_run);
        let mut params = DeleteParams::default();
        if opts.dry_run {
            params = params.dry_run();
        }
        api.delete(&key.name, &params)
            .await
            .map_err(|e| StoreError::from_kube(e, &gvk.kind, &key.to_string()))?;
        Ok(())
    }
}
