use crate::metrics::Timer;
use metrics::{counter, describe_counter, describe_histogram};

/// Register the metrics for the application
pub(super) fn register_metrics() {
    // Requests sent to Grafana, labeled by method and response status (or "error")
    describe_counter!(
        "grafana_requests_total",
        "Total number of requests sent to the Grafana API"
    );

    // Latency of Grafana requests, labeled by method
    describe_histogram!(
        "grafana_request_duration_seconds",
        "Duration of Grafana API requests in seconds"
    );
}

/// Record a request to Grafana with the returned status
pub fn record_request(method: &reqwest::Method, status: &str) {
    counter!(
        "grafana_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Create a timer for a request to Grafana
pub fn request_timer(method: &reqwest::Method) -> Timer {
    Timer::new("grafana_request_duration_seconds").with_label("method", method.to_string())
}
