//! Client configuration, loaded from a YAML file with an environment override
//! for the classifier endpoint.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding the configured classifier endpoint.
pub const API_BASE_URL_ENV: &str = "BOTGUARD_API_BASE_URL";

/// Endpoint used when neither the environment nor the config file names one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote classifier service.
    pub api_base_url: String,
    /// Upper bound on any single request.
    pub request_timeout_seconds: u64,
    /// Automatic retries for idempotent read endpoints only.
    pub read_retries: u32,
    /// Freshness window for the cached model-performance record.
    pub performance_ttl_seconds: u64,
    /// Metric rows shown before the expand affordance.
    pub visible_metrics: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_seconds: 15,
            read_retries: 2,
            performance_ttl_seconds: 300,
            visible_metrics: 3,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Classifier endpoint after applying the environment override.
    pub fn resolved_base_url(&self) -> String {
        match std::env::var(API_BASE_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => value.trim().trim_end_matches('/').to_string(),
            _ => self.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn performance_ttl(&self) -> Duration {
        Duration::from_secs(self.performance_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_classifier() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.read_retries, 2);
        assert_eq!(config.visible_metrics, 3);
        assert_eq!(config.performance_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config: Config =
            serde_yaml::from_str("api_base_url: http://classifier:9000\n").unwrap();
        assert_eq!(config.api_base_url, "http://classifier:9000");
        assert_eq!(config.request_timeout_seconds, 15);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = Config {
            api_base_url: "http://classifier:9000/".to_string(),
            ..Config::default()
        };
        // Only meaningful when the env override is unset; tests do not set it.
        if std::env::var(API_BASE_URL_ENV).is_err() {
            assert_eq!(config.resolved_base_url(), "http://classifier:9000");
        }
    }
}
