use crate::{
    config::DEFAULT_PROFILE,
    diff::Diff,
    grafana::{Grafana, datasource::DatasourceSpec},
    metrics::state::Outcome,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Outcome of a single state, in the shape configuration management engines report
#[derive(Serialize, Debug, Clone)]
pub struct StateResult {
    pub name: String,
    /// `true` when converged, `false` on failure, `None` when a change is pending in test mode
    pub result: Option<bool>,
    pub comment: String,
    pub changes: Value,
}

impl StateResult {
    fn new(name: &str, result: Option<bool>, comment: String) -> Self {
        Self {
            name: name.to_string(),
            result,
            comment,
            changes: Value::Object(Map::new()),
        }
    }

    fn with_changes(mut self, changes: Value) -> Self {
        self.changes = changes;
        self
    }

    /// A failed state carrying the full error chain as its comment
    pub fn failed(name: &str, error: &anyhow::Error) -> Self {
        Self::new(name, Some(false), format!("{:#}", error))
    }

    pub fn has_changes(&self) -> bool {
        self.changes.as_object().is_some_and(|c| !c.is_empty())
    }

    pub fn outcome(&self) -> Outcome {
        match self.result {
            Some(true) if self.has_changes() => Outcome::Changed,
            Some(true) => Outcome::Unchanged,
            Some(false) => Outcome::Failed,
            None => Outcome::Pending,
        }
    }
}

/// Desired data source, as given on the command line or in a state file
#[derive(clap::Args, Deserialize, Debug, Clone)]
pub struct Present {
    /// Name of the data source
    #[arg(long)]
    pub name: String,

    /// Data source type (graphite, influxdb, prometheus, ...)
    #[arg(long = "type")]
    #[serde(rename = "type")]
    pub kind: String,

    /// URL of the data source API
    #[arg(long)]
    pub url: String,

    /// Access mode, proxy or direct
    #[arg(long, default_value = "proxy")]
    #[serde(default = "default_access")]
    pub access: String,

    /// User to authenticate with the data source
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub user: String,

    /// Password to authenticate with the data source
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub password: String,

    /// Database to use with the data source
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub database: String,

    /// Use HTTP basic auth against the data source
    #[arg(long)]
    #[serde(default)]
    pub basic_auth: bool,

    #[arg(long, default_value_t)]
    #[serde(default)]
    pub basic_auth_user: String,

    #[arg(long, default_value_t)]
    #[serde(default)]
    pub basic_auth_password: String,

    /// Make this the default data source
    #[arg(long)]
    #[serde(default)]
    pub is_default: bool,

    /// Additional JSON settings, e.g. '{"timeInterval": "10s"}'
    #[arg(long, value_parser = parse_json)]
    #[serde(default)]
    pub json_data: Option<Value>,

    /// Configuration profile used to connect to Grafana
    #[arg(long, default_value = DEFAULT_PROFILE)]
    #[serde(default = "default_profile")]
    pub profile: String,
}

#[derive(clap::Args, Deserialize, Debug, Clone)]
pub struct Absent {
    /// Name of the data source to remove
    #[arg(long)]
    pub name: String,

    /// Configuration profile used to connect to Grafana
    #[arg(long, default_value = DEFAULT_PROFILE)]
    #[serde(default = "default_profile")]
    pub profile: String,
}

/// One declaration of a state file
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Present(Present),
    Absent(Absent),
}

fn default_access() -> String {
    "proxy".to_string()
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

fn parse_json(value: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(value)
}

impl Present {
    pub fn to_spec(&self) -> DatasourceSpec {
        DatasourceSpec {
            name: self.name.clone(),
            kind: self.kind.clone(),
            url: self.url.clone(),
            access: self.access.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            basic_auth: self.basic_auth,
            basic_auth_user: self.basic_auth_user.clone(),
            basic_auth_password: self.basic_auth_password.clone(),
            is_default: self.is_default,
            json_data: self.json_data.clone(),
        }
    }
}

impl State {
    pub fn name(&self) -> &str {
        match self {
            State::Present(present) => &present.name,
            State::Absent(absent) => &absent.name,
        }
    }

    pub fn profile(&self) -> &str {
        match self {
            State::Present(present) => &present.profile,
            State::Absent(absent) => &absent.profile,
        }
    }

    pub fn function(&self) -> &'static str {
        match self {
            State::Present(_) => "present",
            State::Absent(_) => "absent",
        }
    }

    /// Load an ordered list of states from a YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Vec<State>> {
        tracing::info!("Loading states from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;

        // Declarations are written as `- present: {...}` rather than YAML tags
        let deserializer = serde_norway::Deserializer::from_str(&content);
        serde_norway::with::singleton_map_recursive::deserialize(deserializer)
            .with_context(|| format!("Failed to parse state file {}", path.display()))
    }
}

/// Ensure that a data source is present and matches `spec`
#[tracing::instrument(skip(grafana, spec), fields(name = %spec.name))]
pub async fn present(
    grafana: &Grafana,
    spec: &DatasourceSpec,
    test: bool,
) -> anyhow::Result<StateResult> {
    let name = spec.name.as_str();
    let data = spec.to_map()?;

    let Some(datasource) = grafana.get_datasource(name).await? else {
        if test {
            return Ok(StateResult::new(
                name,
                None,
                format!("Data source {} will be created", name),
            ));
        }

        grafana.create_datasource(spec).await?;

        return Ok(
            StateResult::new(name, Some(true), format!("New data source {} added", name))
                .with_changes(Value::Object(data)),
        );
    };

    let diff = Diff::between(&datasource.to_map(), &data);

    if test {
        if diff.is_empty() {
            return Ok(StateResult::new(
                name,
                Some(true),
                format!("Data source {} already up-to-date", name),
            ));
        }

        return Ok(StateResult::new(
            name,
            None,
            format!("Data source {} will be updated", name),
        )
        .with_changes(serde_json::to_value(diff)?));
    }

    // The full payload is always sent, the diff only shapes the report
    grafana.update_datasource(datasource.id, spec).await?;

    if diff.is_empty() {
        Ok(StateResult::new(
            name,
            Some(true),
            format!("Data source {} already up-to-date", name),
        ))
    } else {
        Ok(
            StateResult::new(name, Some(true), format!("Data source {} updated", name))
                .with_changes(serde_json::to_value(diff)?),
        )
    }
}

/// Ensure that no data source named `name` exists
#[tracing::instrument(skip(grafana))]
pub async fn absent(grafana: &Grafana, name: &str, test: bool) -> anyhow::Result<StateResult> {
    let Some(datasource) = grafana.get_datasource(name).await? else {
        return Ok(StateResult::new(
            name,
            Some(true),
            format!("Data source {} already absent", name),
        ));
    };

    if test {
        return Ok(StateResult::new(
            name,
            None,
            format!("Data source {} will be deleted", name),
        ));
    }

    let status = grafana.delete_datasource(datasource.id).await?;
    if !status.is_success() {
        tracing::warn!("Grafana answered HTTP {} when deleting data source", status);
    }

    let mut changes = Map::new();
    changes.insert(name.to_string(), Value::from("Absent"));

    Ok(
        StateResult::new(name, Some(true), format!("Data source {} was deleted", name))
            .with_changes(Value::Object(changes)),
    )
}
