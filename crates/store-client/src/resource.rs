//! Resource addressing and conversion
//!
//! The store only speaks `DynamicObject`. `ManagedResource` is the capability
//! every resource the helper handles must provide: its group-version-kind,
//! its key, and a conversion to and from the dynamic form. Typed kube
//! resources get it for free; untyped manifests go through [`Unstructured`].

use crate::error::StoreError;
use kube::Resource;
use kube::api::{DynamicObject, GroupVersionKind, ObjectMeta, TypeMeta};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// Namespace/name key of an object or a cluster
///
/// An empty namespace is normalized to `None` (cluster-scoped).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    /// Create a key; an empty namespace means cluster-scoped
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            name: name.to_string(),
        }
    }

    /// Key of a namespaced object
    pub fn namespaced(namespace: &str, name: &str) -> Self {
        Self::new(Some(namespace), name)
    }

    /// Key of a cluster-scoped object
    pub fn cluster_scoped(name: &str) -> Self {
        Self::new(None, name)
    }

    /// Key of the object described by `meta`
    pub fn from_meta(meta: &ObjectMeta) -> Self {
        Self::new(
            meta.namespace.as_deref(),
            meta.name.as_deref().unwrap_or_default(),
        )
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Options applied to create, patch and delete requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Validate and admit the request without persisting it
    pub dry_run: bool,
}

impl WriteOptions {
    /// Options for a request that must not be persisted
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// Group-version-kind of a dynamic object, read from its `apiVersion` and `kind`
pub fn gvk_of(obj: &DynamicObject) -> Result<GroupVersionKind, StoreError> {
    let types = obj.types.as_ref().ok_or_else(|| {
        StoreError::InvalidObject(format!(
            "{} has no apiVersion/kind",
            ObjectKey::from_meta(&obj.metadata)
        ))
    })?;
    if types.kind.is_empty() || types.api_version.is_empty() {
        return Err(StoreError::InvalidObject(format!(
            "{} has an empty apiVersion or kind",
            ObjectKey::from_meta(&obj.metadata)
        )));
    }
    let (group, version) = match types.api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", types.api_version.as_str()),
    };
    Ok(GroupVersionKind::gvk(group, version, &types.kind))
}

/// `apiVersion` string for a group-version-kind (`v1` for the core group)
pub fn api_version_of(gvk: &GroupVersionKind) -> String {
    if gvk.group.is_empty() {
        gvk.version.clone()
    } else {
        format!("{}/{}", gvk.group, gvk.version)
    }
}

/// Group-version-kind of a compiled-in resource type
pub fn gvk_for<K: Resource<DynamicType = ()>>() -> GroupVersionKind {
    GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&()))
}

/// Capability shared by every resource the helper can create, patch or delete
pub trait ManagedResource: Clone + Send + Sync + Sized {
    /// Group-version-kind of the resource
    fn gvk(&self) -> GroupVersionKind;

    /// Namespace/name of the resource
    fn key(&self) -> ObjectKey;

    /// Convert into the dynamic form the store speaks
    fn to_dynamic(&self) -> Result<DynamicObject, StoreError>;

    /// Convert back from the dynamic form
    fn from_dynamic(obj: DynamicObject) -> Result<Self, StoreError>;
}

impl<K> ManagedResource for K
where
    K: Resource<DynamicType = ()> + Serialize + DeserializeOwned + Clone + Send + Sync,
{
    fn gvk(&self) -> GroupVersionKind {
        gvk_for::<K>()
    }

    fn key(&self) -> ObjectKey {
        ObjectKey::from_meta(self.meta())
    }

    fn to_dynamic(&self) -> Result<DynamicObject, StoreError> {
        let mut obj: DynamicObject = serde_json::from_value(serde_json::to_value(self)?)?;
        obj.types = Some(TypeMeta {
            api_version: K::api_version(&()).into_owned(),
            kind: K::kind(&()).into_owned(),
        });
        Ok(obj)
    }

    fn from_dynamic(mut obj: DynamicObject) -> Result<Self, StoreError> {
        // Typed deserializers insist on apiVersion/kind being present
        if obj.types.is_none() {
            obj.types = Some(TypeMeta {
                api_version: K::api_version(&()).into_owned(),
                kind: K::kind(&()).into_owned(),
            });
        }
        Ok(serde_json::from_value(serde_json::to_value(obj)?)?)
    }
}

/// An untyped resource, as read from a manifest
///
/// Always carries its `apiVersion` and `kind`, so it can be addressed without
/// a compiled-in type.
#[derive(Debug, Clone)]
pub struct Unstructured {
    gvk: GroupVersionKind,
    object: DynamicObject,
}

impl Unstructured {
    /// Create an empty object of kind `gvk` named `name`
    pub fn new(gvk: &GroupVersionKind, name: &str) -> Self {
        let object = DynamicObject {
            types: Some(TypeMeta {
                api_version: api_version_of(gvk),
                kind: gvk.kind.clone(),
            }),
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            data: serde_json::Value::Object(serde_json::Map::new()),
        };
        Self { gvk: gvk.clone(), object }
    }

    /// Place the object in `namespace`
    #[must_use]
    pub fn within(mut self, namespace: &str) -> Self {
        self.object.metadata.namespace = Some(namespace.to_string());
        self
    }

    /// Replace the payload (everything but apiVersion, kind and metadata)
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.object.data = payload;
        self
    }

    /// Parse a manifest document
    pub fn from_value(value: serde_json::Value) -> Result<Self, StoreError> {
        let object: DynamicObject = serde_json::from_value(value)?;
        Self::try_from_dynamic(object)
    }

    fn try_from_dynamic(object: DynamicObject) -> Result<Self, StoreError> {
        let gvk = gvk_of(&object)?;
        if object.metadata.name.as_deref().unwrap_or_default().is_empty() {
            return Err(StoreError::InvalidObject(format!(
                "{} manifest has no metadata.name",
                gvk.kind
            )));
        }
        Ok(Self { gvk, object })
    }

    /// Namespace of the object, if any
    pub fn namespace(&self) -> Option<&str> {
        self.object.metadata.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    /// The payload fields
    pub fn payload(&self) -> &serde_json::Value {
        &self.object.data
    }

    /// The object metadata
    pub fn metadata(&self) -> &ObjectMeta {
        &self.object.metadata
    }

    /// Mutable object metadata
    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.object.metadata
    }

    /// The underlying dynamic object
    pub fn into_dynamic(self) -> DynamicObject {
        self.object
    }
}

impl ManagedResource for Unstructured {
    fn gvk(&self) -> GroupVersionKind {
        self.gvk.clone()
    }

    fn key(&self) -> ObjectKey {
        ObjectKey::from_meta(&self.object.metadata)
    }

    fn to_dynamic(&self) -> Result<DynamicObject, StoreError> {
        Ok(self.object.clone())
    }

    fn from_dynamic(obj: DynamicObject) -> Result<Self, StoreError> {
        Self::try_from_dynamic(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Node, Secret};
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    #[test]
    fn test_object_key_display() {
        assert_eq!(ObjectKey::namespaced("fleet", "edge-1").to_string(), "fleet/edge-1");
        assert_eq!(ObjectKey::cluster_scoped("worker-0").to_string(), "worker-0");
        assert_eq!(ObjectKey::new(Some(""), "worker-0"), ObjectKey::cluster_scoped("worker-0"));
    }

    #[test]
    fn test_gvk_of_core_and_grouped() {
        let secret = Unstructured::new(&GroupVersionKind::gvk("", "v1", "Secret"), "creds").into_dynamic();
        assert_eq!(gvk_of(&secret).unwrap(), GroupVersionKind::gvk("", "v1", "Secret"));

        let deployment =
            Unstructured::new(&GroupVersionKind::gvk("apps", "v1", "Deployment"), "web").into_dynamic();
        assert_eq!(gvk_of(&deployment).unwrap().group, "apps");

        let untyped = DynamicObject {
            types: None,
            metadata: ObjectMeta::default(),
            data: serde_json::Value::Null,
        };
        assert!(matches!(gvk_of(&untyped), Err(StoreError::InvalidObject(_))));
    }

    #[test]
    fn test_typed_resource_round_trips_through_dynamic() {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("creds".to_string()),
                namespace: Some("fleet".to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(
                "color".to_string(),
                ByteString(b"yellow".to_vec()),
            )])),
            ..Default::default()
        };

        assert_eq!(secret.gvk(), GroupVersionKind::gvk("", "v1", "Secret"));
        assert_eq!(secret.key(), ObjectKey::namespaced("fleet", "creds"));

        let dynamic = secret.to_dynamic().unwrap();
        assert_eq!(dynamic.types.as_ref().unwrap().kind, "Secret");
        assert_eq!(dynamic.data["data"]["color"], "eWVsbG93");

        let back = Secret::from_dynamic(dynamic).unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn test_cluster_scoped_typed_resource_key() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("worker-0".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(node.key(), ObjectKey::cluster_scoped("worker-0"));
    }

    #[test]
    fn test_unstructured_from_manifest_requires_name() {
        let parsed = Unstructured::from_value(serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "settings", "namespace": "fleet" },
            "data": { "color": "red" }
        }))
        .unwrap();
        assert_eq!(parsed.key(), ObjectKey::namespaced("fleet", "settings"));
        assert_eq!(parsed.payload()["data"]["color"], "red");

        let nameless = Unstructured::from_value(serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {}
        }));
        assert!(matches!(nameless, Err(StoreError::InvalidObject(_))));
    }
}
