use crate::metrics::DEFAULT_ABSENCE_THRESHOLD_CM;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const CONFIG_PATH_ENV: &str = "STUDY_MONITOR_CONFIG";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub metrics: Option<MetricsSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

/// Where and how to query the STH historical API.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceSection {
    pub base_url: String,
    pub fiware_service: String,
    pub fiware_service_path: String,
    pub entity_type: String,
    pub entity_id: String,
    pub attribute: String,
    /// Number of most recent values requested per poll
    pub last_n: u32,
    pub timeout_secs: u64,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8666".to_string(),
            fiware_service: "smart".to_string(),
            fiware_service_path: "/".to_string(),
            entity_type: "RoboEstudante".to_string(),
            entity_id: "urn:ngsi-ld:RoboEstudante:001".to_string(),
            attribute: "d".to_string(),
            last_n: 50,
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsSection {
    /// Distance (cm) above which the student is counted as away
    pub absence_threshold_cm: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
    /// Seconds between two polls of the data source (default: 10)
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Path from `STUDY_MONITOR_CONFIG` if set, otherwise [`DEFAULT_CONFIG_PATH`].
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    pub fn absence_threshold_cm(&self) -> f64 {
        self.metrics
            .as_ref()
            .and_then(|m| m.absence_threshold_cm)
            .unwrap_or(DEFAULT_ABSENCE_THRESHOLD_CM)
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Returns the poll interval as Duration (default: 10 seconds, never zero)
    pub fn poll_interval(&self) -> Duration {
        let secs = self
            .server
            .as_ref()
            .and_then(|s| s.poll_interval_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    pub fn log_level(&self) -> Option<tracing::Level> {
        self.logging.level.trim().parse().ok()
    }
}
