//! Driver configuration, loaded from environment variables.

use crate::error::DriverError;
use std::env;
use std::path::PathBuf;

/// Settings for one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverConfig {
    /// `KUBECONFIG`: kubeconfig of the management cluster; a list of several
    /// files is left to the default loading rules, which merge them
    pub kubeconfig: Option<PathBuf>,
    /// `KUBE_CONTEXT`: context to use within the kubeconfig
    pub context: Option<String>,
    /// `WATCH_NAMESPACE`: only clusters registered in this namespace
    pub watch_namespace: String,
    /// `TARGET_NAMESPACE`: namespace for manifests that do not name one
    pub target_namespace: String,
    /// `DRY_RUN`: simulate every write
    pub dry_run: bool,
    /// `MANIFEST_PATH`: multi-document YAML to apply to every cluster
    pub manifest_path: PathBuf,
}

impl DriverConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, DriverError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from any variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DriverError> {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let manifest_path = var("MANIFEST_PATH").ok_or_else(|| {
            DriverError::InvalidConfig("MANIFEST_PATH environment variable is required".to_string())
        })?;
        let dry_run = match var("DRY_RUN").as_deref() {
            None | Some("false" | "0") => false,
            Some("true" | "1") => true,
            Some(other) => {
                return Err(DriverError::InvalidConfig(format!(
                    "DRY_RUN must be true, false, 1 or 0, got {:?}",
                    other
                )));
            }
        };

        Ok(Self {
            kubeconfig: var("KUBECONFIG").and_then(single_path),
            context: var("KUBE_CONTEXT"),
            watch_namespace: var("WATCH_NAMESPACE").unwrap_or_default(),
            target_namespace: var("TARGET_NAMESPACE").unwrap_or_default(),
            dry_run,
            manifest_path: PathBuf::from(manifest_path),
        })
    }
}

fn single_path(value: String) -> Option<PathBuf> {
    let mut paths = env::split_paths(&value).filter(|path| !path.as_os_str().is_empty());
    match (paths.next(), paths.next()) {
        (Some(path), None) => Some(path),
        _ => None,
    }
}
