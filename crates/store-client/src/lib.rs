//! Object store client
//!
//! A narrow client capability over a Kubernetes-style object store: get, list,
//! create, patch and delete of arbitrary resources addressed by
//! group-version-kind plus namespace and name.
//!
//! # Example
//!
//! ```no_run
//! use store_client::{KubeStoreClient, ObjectKey, StoreClient, WriteOptions};
//! use kube::api::GroupVersionKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeStoreClient::try_default().await?;
//!
//! let secrets = GroupVersionKind::gvk("", "v1", "Secret");
//! let key = ObjectKey::namespaced("kube-system", "bootstrap-token");
//! let secret = client.get(&secrets, &key).await?;
//!
//! // Validate a write server-side without persisting it
//! client.delete(&secret, &WriteOptions::dry_run()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Dynamic resources**: every operation works on `DynamicObject`s
//! - **Typed resources**: `ManagedResource` converts typed kube resources to and from the dynamic form
//! - **Dry run**: `WriteOptions::dry_run()` maps onto the API server's `dryRun=All`
//! - **Mocking**: `MockStoreClient` behind the `test-util` feature

pub mod client;
pub mod error;
pub mod resource;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeStoreClient;
pub use error::StoreError;
pub use resource::{ManagedResource, ObjectKey, Unstructured, WriteOptions, gvk_for, gvk_of};
pub use store_trait::StoreClient;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockOperation, MockStoreClient};
