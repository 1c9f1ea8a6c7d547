//! Prometheus export of the run counters
//!
//! A reduction is a batch job, so counters are rendered once at the end of
//! the run in the Prometheus text format (suitable for a node-exporter
//! textfile collector) rather than served over HTTP.

use flavtag_core::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use tracing::info;

/// Install the global Prometheus recorder and describe the flavtag metrics
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    flavtag_telemetry::describe_metrics();

    info!("Metrics recorder installed");
    Ok(handle)
}

/// Render all recorded metrics into `path`
pub async fn write_textfile(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    tokio::fs::write(path, handle.render()).await?;
    info!(path = %path.display(), "Metrics written");
    Ok(())
}
