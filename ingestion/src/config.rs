use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::provider::StatGroups;
use crate::retry::RetryPolicy;

pub const FANGRAPHS_BASE_URL: &str = "https://www.fangraphs.com";
pub const CHADWICK_REGISTER_URL: &str =
    "https://raw.githubusercontent.com/chadwickbureau/register/master/data";

/// Runtime settings, loaded from an optional YAML file. Every section and
/// key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub database: DatabaseSettings,
    pub writer: WriterSettings,
    pub backfill: BackfillSettings,
    pub source: SourceSettings,
    pub people: PeopleSettings,
}

impl IngestConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Reads `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::from_yaml_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    pub batch_size: usize,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            batch_size: database::writers::DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillSettings {
    pub start_year: i32,
    pub end_year: i32,
    pub chunk_size: u32,
    pub chunk_pause_secs: u64,
    pub era_size: u32,
    pub test_year: i32,
}

impl Default for BackfillSettings {
    fn default() -> Self {
        Self {
            start_year: 1876,
            end_year: 2024,
            chunk_size: 5,
            chunk_pause_secs: 5,
            era_size: 20,
            test_year: 2023,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub base_url: String,
    pub user_agent: String,
    pub requests_per_minute: u32,
    pub burst: u32,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub jitter_ms: u64,
    pub fetch_concurrency: usize,
    pub timeout_secs: u64,
    pub groups: StatGroups,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: FANGRAPHS_BASE_URL.to_string(),
            user_agent: concat!("baseball-ingestion/", env!("CARGO_PKG_VERSION")).to_string(),
            requests_per_minute: 30,
            burst: 2,
            max_retries: 5,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 60_000,
            jitter_ms: 250,
            fetch_concurrency: 2,
            timeout_secs: 60,
            groups: StatGroups::default(),
        }
    }
}

impl SourceSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_backoff_ms),
            max_delay: Duration::from_millis(self.max_backoff_ms),
            jitter: Duration::from_millis(self.jitter_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeopleSettings {
    /// Look up birth dates of new players in the Chadwick register.
    pub enabled: bool,
    pub register_url: String,
}

impl Default for PeopleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            register_url: CHADWICK_REGISTER_URL.to_string(),
        }
    }
}
