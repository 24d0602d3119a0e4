use crate::{
    config::Config,
    grafana::Grafana,
    metrics,
    state::{self, State, StateResult},
};
use std::path::Path;

pub struct Runner {
    config: Config,
    test: bool,
}

impl Runner {
    /// Create a new Runner instance
    pub fn new(config: Config, test: bool) -> Self {
        Self { config, test }
    }

    /// Apply a single state, propagating any error
    #[tracing::instrument(
        skip(self, state),
        fields(function = state.function(), name = state.name())
    )]
    pub async fn apply(&self, state: &State) -> anyhow::Result<StateResult> {
        let grafana = self.grafana(state.profile())?;

        let result = match state {
            State::Present(present) => {
                state::present(&grafana, &present.to_spec(), self.test).await
            }
            State::Absent(absent) => state::absent(&grafana, &absent.name, self.test).await,
        };

        match &result {
            Ok(ret) => {
                metrics::state::record_result(state.function(), ret.outcome());
                tracing::info!("{}", ret.comment);
            }
            Err(_) => {
                metrics::state::record_result(state.function(), metrics::state::Outcome::Failed);
            }
        }

        result
    }

    /// Apply states in order. A failing state is reported and does not stop the run.
    pub async fn apply_all(&self, states: &[State]) -> Vec<StateResult> {
        let mut results = Vec::with_capacity(states.len());

        for state in states {
            match self.apply(state).await {
                Ok(ret) => results.push(ret),
                Err(e) => {
                    tracing::error!(
                        "State {} '{}' failed: {:#}",
                        state.function(),
                        state.name(),
                        e
                    );
                    results.push(StateResult::failed(state.name(), &e));
                }
            }
        }

        results
    }

    /// Load a state file and apply every declaration in it
    pub async fn apply_file(&self, path: &Path) -> anyhow::Result<Vec<StateResult>> {
        let states = State::from_file(path)?;

        Ok(self.apply_all(&states).await)
    }

    /// Build a Grafana client for a named profile
    fn grafana(&self, profile: &str) -> anyhow::Result<Grafana> {
        Grafana::new(self.config.profile(profile)?.clone())
    }
}

/// Fail when any state ended with `result: false`
pub fn ensure_succeeded(results: &[StateResult]) -> anyhow::Result<()> {
    let failed = results
        .iter()
        .filter(|ret| ret.result == Some(false))
        .count();

    if failed > 0 {
        return Err(anyhow::anyhow!("{} of {} states failed", failed, results.len()));
    }

    Ok(())
}
