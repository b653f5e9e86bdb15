//! Configuration management for the fraud detection review core

use crate::classifier::RiskTierThresholds;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub classification: RiskTierThresholds,
    #[serde(default)]
    pub display: DisplayDefaults,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dashboard API connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL the `/transactions` and `/anomalies` routes hang off
    pub base_url: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Token forwarded as `Authorization: Bearer ...`, obtained by the caller's auth layer
    #[serde(default)]
    pub bearer_token: Option<String>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_ms: default_timeout_ms(),
            bearer_token: None,
        }
    }
}

/// Fallback values shown when a transaction omits a field.
///
/// These mirror what the simulation result page has always displayed. Whether
/// they are deliberate simulation defaults or mask missing data upstream is
/// still awaiting product confirmation, so they live in config rather than code.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayDefaults {
    #[serde(default = "default_transaction_type")]
    pub default_transaction_type: String,
    #[serde(default = "default_device_type")]
    pub default_device_type: String,
    #[serde(default = "default_detection_source")]
    pub default_detection_source: String,
}

pub const DEFAULT_TRANSACTION_TYPE: &str = "p2p_transfer";
pub const DEFAULT_DEVICE_TYPE: &str = "desktop";
pub const DEFAULT_DETECTION_SOURCE: &str = "ML/Rules";

fn default_transaction_type() -> String {
    DEFAULT_TRANSACTION_TYPE.to_string()
}

fn default_device_type() -> String {
    DEFAULT_DEVICE_TYPE.to_string()
}

fn default_detection_source() -> String {
    DEFAULT_DETECTION_SOURCE.to_string()
}

impl Default for DisplayDefaults {
    fn default() -> Self {
        Self {
            default_transaction_type: default_transaction_type(),
            default_device_type: default_device_type(),
            default_detection_source: default_detection_source(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, with `REVIEW__*` environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("REVIEW").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.classification.critical, 0.98);
        assert_eq!(config.classification.high, 0.80);
        assert_eq!(config.classification.medium, 0.50);
        assert_eq!(config.display.default_device_type, "desktop");
        assert_eq!(config.display.default_transaction_type, "p2p_transfer");
    }

    #[test]
    fn test_load_partial_file() {
        let path = std::env::temp_dir().join(format!("review-config-{}.toml", uuid::Uuid::new_v4()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "[api]\nbase_url = \"http://api.test\"\n\n[display]\ndefault_device_type = \"mobile\"").unwrap();
        }

        let config = AppConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.api.base_url, "http://api.test");
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.display.default_device_type, "mobile");
        assert_eq!(config.display.default_transaction_type, "p2p_transfer");
        assert_eq!(config.classification.critical, 0.98);
    }
}
