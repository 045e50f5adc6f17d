//! Manifest loading: multi-document YAML into untyped resources.

use crate::error::DriverError;
use serde::Deserialize;
use std::path::Path;
use store_client::{ManagedResource, Unstructured};
use tracing::debug;

/// Read and parse the manifest file at `path`
pub async fn load_manifests(path: &Path, target_namespace: &str) -> Result<Vec<Unstructured>, DriverError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DriverError::ManifestRead {
            path: path.display().to_string(),
            source,
        })?;
    parse_manifests(&text, target_namespace)
}

/// Parse every document of a YAML stream, skipping empty ones
///
/// Documents without a namespace are placed in `target_namespace` when it is
/// not empty.
pub fn parse_manifests(text: &str, target_namespace: &str) -> Result<Vec<Unstructured>, DriverError> {
    let mut manifests = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = serde_json::Value::deserialize(document)
            .map_err(|source| DriverError::ManifestParse { index, source })?;
        if value.is_null() {
            continue;
        }

        let mut manifest =
            Unstructured::from_value(value).map_err(|source| DriverError::ManifestObject { index, source })?;
        if manifest.namespace().is_none() && !target_namespace.is_empty() {
            manifest = manifest.within(target_namespace);
        }
        debug!("Loaded {} {}", manifest.gvk().kind, manifest.key());
        manifests.push(manifest);
    }
    Ok(manifests)
}
