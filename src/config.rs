use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, path::Path, time::Duration};

/// Seconds to wait for Grafana when a profile does not set `grafana_timeout`
pub const DEFAULT_TIMEOUT_SECS: u64 = 3;

/// Name of the profile used when a state does not pick one
pub const DEFAULT_PROFILE: &str = "grafana";

#[derive(Debug, Deserialize, Clone)]
#[serde(transparent)]
pub struct Config {
    pub profiles: HashMap<String, Profile>,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub url: String,
    pub token: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub insecure: bool,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::info!("Loading config from {}", path.display());

        let config = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_yaml(&config)
    }

    /// Parse configuration from YAML
    pub fn from_yaml(config: &str) -> Result<Self> {
        Ok(serde_norway::from_str(config)?)
    }

    /// Resolve a named profile
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Profile '{}' not found in config", name))
    }
}

impl Profile {
    /// Create a new profile, resolving the token from an environment variable if needed
    pub fn new(
        url: String,
        token: Option<String>,
        token_from: Option<String>,
        timeout: Option<u64>,
        insecure: bool,
    ) -> Result<Self> {
        let token = match (token, token_from) {
            (Some(token), _) => Some(token),
            (None, Some(var)) => Some(
                std::env::var(&var)
                    .with_context(|| format!("Environment variable {} is not set", var))?,
            ),
            (None, None) => None,
        };

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            token,
            user: None,
            password: None,
            timeout: Duration::from_secs(timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            insecure,
        })
    }

    /// Use HTTP basic auth when no token is configured
    pub fn with_basic_auth(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }
}

impl<'de> Deserialize<'de> for Profile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ProfileRaw {
            grafana_url: String,
            grafana_token: Option<String>,
            grafana_token_from: Option<String>,
            grafana_timeout: Option<u64>,
            grafana_user: Option<String>,
            grafana_password: Option<String>,
            #[serde(default)]
            insecure: bool,
        }

        let raw = ProfileRaw::deserialize(deserializer)?;
        let profile = Profile::new(
            raw.grafana_url,
            raw.grafana_token,
            raw.grafana_token_from,
            raw.grafana_timeout,
            raw.insecure,
        )
        .map_err(serde::de::Error::custom)?;

        Ok(profile.with_basic_auth(raw.grafana_user, raw.grafana_password))
    }
}
