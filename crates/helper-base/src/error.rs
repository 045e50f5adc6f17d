//! Tool error types.
//!
//! Store errors pass through unchanged (`ToolError::Store`) so callers can keep
//! matching on "not found" and "already exists". The remaining variants cover
//! failures that originate in the helper itself.

use store_client::StoreError;
use thiserror::Error;

/// Errors returned by [`crate::Tool`] operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Error reported by a management or workload store, passed through verbatim
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A client could not be built for a cluster
    #[error("failed to create client for {cluster}: {source}")]
    Connection {
        /// `management` or the workload cluster's `namespace/name`
        cluster: String,
        #[source]
        source: StoreError,
    },

    /// The workload cluster cannot be resolved (e.g. its kubeconfig secret is missing)
    #[error("workload cluster {0} could not be resolved: {1}")]
    ClusterLookup(String, String),

    /// Listing Cluster records in the management cluster failed
    #[error("failed to list workload clusters in management cluster: {0}")]
    ClusterList(#[source] StoreError),

    /// The caller cancelled the operation before its store round trip completed
    #[error("operation cancelled")]
    Cancelled,
}

impl ToolError {
    /// Whether the error is a store "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, ToolError::Store(e) if e.is_not_found())
    }

    /// Whether the error is a store "already exists"
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ToolError::Store(e) if e.is_already_exists())
    }

    /// Whether the error is an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, ToolError::Store(e) if e.is_conflict())
    }

    /// Whether the operation was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ToolError::Cancelled)
    }
}
