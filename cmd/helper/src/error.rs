//! Driver-specific error types.
//!
//! Failures of the sweep itself. Per-cluster failures are not errors of the
//! driver: they are recorded on the tool and reported at the end.

use helper_base::ToolError;
use store_client::StoreError;
use thiserror::Error;

/// Errors that stop the helper before or instead of a sweep.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Manifest file could not be read
    #[error("Failed to read manifest {path}: {source}")]
    ManifestRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Manifest document is not valid YAML
    #[error("Invalid manifest document {index}: {source}")]
    ManifestParse {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    /// Manifest document is not a Kubernetes object
    #[error("Invalid manifest document {index}: {source}")]
    ManifestObject {
        index: usize,
        #[source]
        source: StoreError,
    },

    /// Tool error outside any single cluster (directory listing, management connection)
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The report could not be written
    #[error("Failed to write report: {0}")]
    Report(#[from] std::io::Error),

    /// One or more clusters failed
    #[error("{failed} of {total} clusters failed")]
    ClustersFailed { failed: usize, total: usize },
}
