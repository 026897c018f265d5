//! Configuration module for gator.
//!
//! The configuration lives in a single JSON file in the user's home
//! directory. It is read once at start-up and rewritten whenever the
//! current user changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{GatorError, Result};

/// File name of the configuration file inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".gatorconfig.json";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file; stderr only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Feed fetching configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
}

fn default_user_agent() -> String {
    "gator".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_feed_size_bytes: default_max_feed_size(),
        }
    }
}

/// What the aggregation loop does when a feed cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the loop and surface the error.
    #[default]
    Abort,
    /// Log the error and carry on with the next tick.
    Skip,
}

/// Aggregation loop configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Policy applied to fetch failures.
    #[serde(default)]
    pub on_fetch_error: FailurePolicy,
}

/// Display configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Timezone for displaying dates (e.g., "Europe/Berlin", "UTC").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

/// Serializes tests that touch `GATOR_DB_URL`.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Database connection string.
    #[serde(default)]
    pub db_url: String,
    /// Name of the current user; empty when nobody is logged in.
    #[serde(default)]
    pub current_user_name: String,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Feed fetching configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Aggregation loop configuration.
    #[serde(default)]
    pub aggregate: AggregateConfig,
    /// Display configuration.
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Default location of the configuration file (`~/.gatorconfig.json`).
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| GatorError::Config("cannot determine home directory".to_string()))?;
        Ok(home.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GatorError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a JSON file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a JSON string.
    pub fn parse(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| GatorError::Config(format!("config parse error: {e}")))
    }

    /// Write the configuration back to disk as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| GatorError::Config(format!("config encode error: {e}")))?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `GATOR_DB_URL`: Override the database connection string
    pub fn apply_env_overrides(&mut self) {
        if let Ok(db_url) = std::env::var("GATOR_DB_URL") {
            if !db_url.is_empty() {
                self.db_url = db_url;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.db_url.is_empty() {
            return Err(GatorError::Config(
                "db_url is not set. Set it in the config file or via GATOR_DB_URL.".to_string(),
            ));
        }
        if self.display.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(GatorError::Config(format!(
                "unknown timezone: {}",
                self.display.timezone
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.db_url.is_empty());
        assert!(config.current_user_name.is_empty());
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
        assert_eq!(config.fetch.user_agent, "gator");
        assert_eq!(config.fetch.connect_timeout_secs, 10);
        assert_eq!(config.fetch.total_timeout_secs, 30);
        assert_eq!(config.fetch.max_feed_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.aggregate.on_fetch_error, FailurePolicy::Abort);
        assert_eq!(config.display.timezone, "UTC");
    }

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{"db_url":"postgres://localhost/gator","current_user_name":""}"#;
        let config = Config::parse(json).unwrap();

        assert_eq!(config.db_url, "postgres://localhost/gator");
        assert!(config.current_user_name.is_empty());
        assert_eq!(config.fetch, FetchConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "db_url": "sqlite://gator.db",
            "current_user_name": "alice",
            "logging": { "level": "debug", "file": "logs/gator.log" },
            "fetch": {
                "user_agent": "gator-test",
                "connect_timeout_secs": 3,
                "total_timeout_secs": 9,
                "max_feed_size_bytes": 1024
            },
            "aggregate": { "on_fetch_error": "skip" },
            "display": { "timezone": "Asia/Tokyo" }
        }"#;
        let config = Config::parse(json).unwrap();

        assert_eq!(config.current_user_name, "alice");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("logs/gator.log"));
        assert_eq!(config.fetch.user_agent, "gator-test");
        assert_eq!(config.fetch.connect_timeout_secs, 3);
        assert_eq!(config.fetch.total_timeout_secs, 9);
        assert_eq!(config.fetch.max_feed_size_bytes, 1024);
        assert_eq!(config.aggregate.on_fetch_error, FailurePolicy::Skip);
        assert_eq!(config.display.timezone, "Asia/Tokyo");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("{ not json");

        if let Err(GatorError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent-gator-config.json");
        assert!(matches!(result, Err(GatorError::Io(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.db_url = "sqlite://gator.db".to_string();
        config.current_user_name = "bob".to_string();
        config.save(&path).unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded, config);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"current_user_name\": \"bob\""));
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(GatorError::Config(_))));

        config.db_url = "sqlite::memory:".to_string();
        assert!(config.validate().is_ok());

        config.display.timezone = "Mars/Olympus".to_string();
        assert!(matches!(config.validate(), Err(GatorError::Config(_))));
    }

    #[test]
    fn test_apply_env_overrides_db_url() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let original = std::env::var("GATOR_DB_URL").ok();

        std::env::set_var("GATOR_DB_URL", "sqlite://from-env.db");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.db_url, "sqlite://from-env.db");

        std::env::set_var("GATOR_DB_URL", "");
        let mut config = Config::default();
        config.db_url = "sqlite://original.db".to_string();
        config.apply_env_overrides();
        assert_eq!(config.db_url, "sqlite://original.db");

        if let Some(val) = original {
            std::env::set_var("GATOR_DB_URL", val);
        } else {
            std::env::remove_var("GATOR_DB_URL");
        }
    }
}
