use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::{path::Path, time::Instant};

pub mod grafana;
pub mod process;
pub mod state;

pub static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Register the metrics for the application
pub fn register_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("Metrics handle already set"))?;

    grafana::register_metrics();
    process::register_metrics();
    state::register_metrics();

    Ok(())
}

/// Write the rendered metrics to a file, in the format read by the node_exporter textfile collector
pub fn write_textfile(path: &Path) -> anyhow::Result<()> {
    let handle = METRICS_HANDLE
        .get()
        .ok_or_else(|| anyhow::anyhow!("Metrics recorder is not installed"))?;

    std::fs::write(path, handle.render())
        .with_context(|| format!("Failed to write metrics to {}", path.display()))?;

    tracing::debug!("Wrote metrics to {}", path.display());

    Ok(())
}

pub struct Timer {
    metric_name: &'static str,
    start_time: Instant,
    labels: Vec<(String, String)>,
}

impl Timer {
    /// Create a new timer
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            metric_name,
            start_time: Instant::now(),
            labels: Vec::new(),
        }
    }

    /// Add a label to the timer
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start_time.elapsed().as_secs_f64();

        if self.labels.is_empty() {
            metrics::histogram!(self.metric_name).record(duration);
        } else {
            let labels: Vec<_> = self
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            metrics::histogram!(self.metric_name, &labels).record(duration);
        }
    }
}
