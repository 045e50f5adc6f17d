//! Fleet helper core
//!
//! Applies create/patch/delete operations for Kubernetes resources against
//! many Cluster API workload clusters registered in one management cluster.
//!
//! The [`Tool`] is the single entry point. It lazily builds and caches one
//! store client per cluster, memoizes the cluster directory, simulates writes
//! in dry-run mode, and collects a human-readable output log plus the latest
//! error for every cluster so a fleet-wide sweep can report partial success.
//!
//! # Example
//!
//! ```no_run
//! use helper_base::{Tool, ToolConfig};
//! use store_client::Unstructured;
//! use kube::api::GroupVersionKind;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tool = Tool::new(ToolConfig {
//!     watching_namespace: "fleet".to_string(),
//!     dry_run: true,
//!     ..Default::default()
//! });
//! let cancel = CancellationToken::new();
//!
//! let settings = Unstructured::new(&GroupVersionKind::gvk("", "v1", "ConfigMap"), "settings")
//!     .within("kube-system")
//!     .with_payload(serde_json::json!({ "data": { "color": "red" } }));
//!
//! for cluster in tool.get_clusters(&cancel).await?.iter() {
//!     if let Err(e) = tool.workload_create_or_patch(&cancel, cluster, &settings).await {
//!         tool.record_error(cluster, e);
//!     }
//!     print!("{}", tool.output_for(cluster));
//! }
//! # Ok(())
//! # }
//! ```

pub mod apply;
mod cancel;
pub mod client_cache;
pub mod config;
pub mod directory;
pub mod error;
pub mod output;
pub mod tool;

#[cfg(test)]
mod test_utils;

pub use apply::ApplyOutcome;
pub use client_cache::{RemoteClusterClientFactory, WorkloadClientFactory};
pub use config::ToolConfig;
pub use error::ToolError;
pub use output::OutputBuffer;
pub use tool::{Tool, cluster_key};
