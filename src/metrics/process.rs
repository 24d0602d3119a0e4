use metrics::{describe_gauge, gauge};

/// Register the metrics for the application
pub(super) fn register_metrics() {
    // Build information of the application
    describe_gauge!(
        "build_info",
        "Build information of the application, labeled by version"
    );

    // Completion time of the run
    describe_gauge!(
        "last_run_timestamp_seconds",
        "Time the last run finished in seconds since the Unix epoch"
    );

    record_build_info();
}

/// Record the build information of the application
pub fn record_build_info() {
    let version = env!("CARGO_PKG_VERSION");

    gauge!("build_info", "version" => version.to_string()).set(1.0);
}

/// Record the time the run finished
pub fn record_run_finished() {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();

    gauge!("last_run_timestamp_seconds").set(now);
}
