//! Fleet Helper
//!
//! Applies a set of manifests to every Cluster API workload cluster
//! registered in a management cluster:
//! - lists `Cluster` records (optionally within one namespace)
//! - creates missing objects, patches drifted ones, leaves the rest alone
//! - prints what happened per cluster, secret values redacted
//!
//! Configuration comes from environment variables; see [`config::DriverConfig`].

mod config;
mod error;
mod manifest;
mod sweep;

use crate::config::DriverConfig;
use crate::error::DriverError;
use helper_base::{Tool, ToolConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), DriverError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Fleet Helper");

    let config = DriverConfig::from_env()?;
    info!("Configuration:");
    info!(
        "  Kubeconfig: {}",
        config
            .kubeconfig
            .as_ref()
            .map_or_else(|| "default".to_string(), |path| path.display().to_string())
    );
    info!("  Context: {}", config.context.as_deref().unwrap_or("current"));
    info!(
        "  Watch namespace: {}",
        if config.watch_namespace.is_empty() { "all namespaces" } else { config.watch_namespace.as_str() }
    );
    info!("  Target namespace: {}", config.target_namespace);
    info!("  Dry run: {}", config.dry_run);
    info!("  Manifest: {}", config.manifest_path.display());

    let manifests = manifest::load_manifests(&config.manifest_path, &config.target_namespace).await?;
    info!("Loaded {} manifests", manifests.len());

    let tool = Arc::new(Tool::new(ToolConfig {
        kubeconfig: config.kubeconfig,
        context: config.context,
        target_namespace: config.target_namespace,
        watching_namespace: config.watch_namespace,
        dry_run: config.dry_run,
        ..Default::default()
    }));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight operations");
            on_interrupt.cancel();
        }
    });

    let clusters = sweep::sweep(Arc::clone(&tool), Arc::new(manifests), cancel).await?;
    let failed = sweep::report(&tool, &clusters, &mut std::io::stdout().lock())?;
    if failed > 0 {
        return Err(DriverError::ClustersFailed {
            failed,
            total: clusters.len(),
        });
    }

    info!("Applied manifests to {} clusters", clusters.len());
    Ok(())
}
