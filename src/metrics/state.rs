use metrics::{counter, describe_counter};

/// Register the metrics for the application
pub(super) fn register_metrics() {
    // Evaluated states, labeled by state function and outcome
    describe_counter!("state_results_total", "Total number of evaluated states");
}

/// Record the outcome of a state
pub fn record_result(state: &str, outcome: Outcome) {
    counter!("state_results_total", "state" => state.to_string(), "outcome" => outcome.to_string())
        .increment(1);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Changed,
    Unchanged,
    Pending,
    Failed,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Changed => write!(f, "changed"),
            Outcome::Unchanged => write!(f, "unchanged"),
            Outcome::Pending => write!(f, "pending"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}
