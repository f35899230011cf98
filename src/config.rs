//! Configuration management for the fraud review engine

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Detection and review-policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Manually configured review threshold, blended with the adaptive
    /// threshold per transaction
    #[serde(default = "default_manual_threshold")]
    pub manual_threshold: f64,
    /// Maximum number of scored transactions retained in history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Dispatch alerts to enabled integrations for fraud verdicts
    #[serde(default = "default_realtime_alerts")]
    pub realtime_alerts: bool,
    /// Record an auto-lock audit entry for near-certain fraud (>= 0.95)
    #[serde(default)]
    pub auto_lock: bool,
}

fn default_manual_threshold() -> f64 {
    0.7
}

fn default_history_limit() -> usize {
    120
}

fn default_realtime_alerts() -> bool {
    true
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the JSON storage slots
    pub data_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default file location
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig {
                manual_threshold: default_manual_threshold(),
                history_limit: default_history_limit(),
                realtime_alerts: default_realtime_alerts(),
                auto_lock: false,
            },
            storage: StorageConfig {
                data_dir: "data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.manual_threshold, 0.7);
        assert_eq!(config.detection.history_limit, 120);
        assert!(config.detection.realtime_alerts);
        assert!(!config.detection.auto_lock);
        assert_eq!(config.storage.data_dir, "data");
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[detection]
manual_threshold = 0.6
auto_lock = true

[storage]
data_dir = "/tmp/review-data"

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.detection.manual_threshold, 0.6);
        assert!(config.detection.auto_lock);
        // Defaults fill the omitted keys
        assert_eq!(config.detection.history_limit, 120);
        assert_eq!(config.logging.level, "debug");
    }
}
