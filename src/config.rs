//! Application configuration.
//!
//! Resolution order:
//! 1. `TAGDROP_CONFIG` environment variable (path to a TOML file)
//! 2. `<config dir>/tagdrop/config.toml` if it exists
//! 3. Compiled defaults
//!
//! `TAGDROP_BACKEND_URL` overrides the backend URL after the file is loaded.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const CONFIG_ENV: &str = "TAGDROP_CONFIG";
const BACKEND_URL_ENV: &str = "TAGDROP_BACKEND_URL";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    pub request_timeout_secs: u64,
    pub notification_timeout_secs: u64,
    pub polling: PollingConfig,
    pub stages: StageTimings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 30,
            notification_timeout_secs: 5,
            polling: PollingConfig::default(),
            stages: StageTimings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub health_secs: u64,
    pub activity_secs: u64,
    pub activity_limit: usize,
    pub files_secs: u64,
    pub files_limit: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            health_secs: 10,
            activity_secs: 5,
            activity_limit: 5,
            files_secs: 10,
            files_limit: 50,
        }
    }
}

/// Time spent in each simulated processing stage, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StageTimings {
    pub accept_delay_ms: u64,
    pub media_analyzing_ms: u64,
    pub media_tagging_ms: u64,
    pub media_storing_ms: u64,
    pub structured_analyzing_ms: u64,
    pub structured_storing_ms: u64,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self {
            accept_delay_ms: 500,
            media_analyzing_ms: 1500,
            media_tagging_ms: 2000,
            media_storing_ms: 2000,
            structured_analyzing_ms: 1500,
            structured_storing_ms: 2000,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            config.backend_url = url;
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.polling.validate()?;
        Ok(config)
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        dirs::config_dir()
            .map(|dir| dir.join("tagdrop").join("config.toml"))
            .filter(|path| path.exists())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification_timeout_secs)
    }
}

impl PollingConfig {
    /// Every cadence must be at least one second.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, secs) in [
            ("health_secs", self.health_secs),
            ("activity_secs", self.activity_secs),
            ("files_secs", self.files_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ZeroCadence(field));
            }
        }
        Ok(())
    }

    pub fn health_cadence(&self) -> Duration {
        Duration::from_secs(self.health_secs)
    }

    pub fn activity_cadence(&self) -> Duration {
        Duration::from_secs(self.activity_secs)
    }

    pub fn files_cadence(&self) -> Duration {
        Duration::from_secs(self.files_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.backend_url, "http://localhost:5000");
        assert_eq!(config.polling.health_secs, 10);
        assert_eq!(config.polling.activity_secs, 5);
        assert_eq!(config.polling.activity_limit, 5);
        assert_eq!(config.stages.media_analyzing_ms, 1500);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml(
            r#"
            backend_url = "http://10.0.0.2:5000"

            [polling]
            activity_limit = 10

            [stages]
            structured_storing_ms = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.backend_url, "http://10.0.0.2:5000");
        assert_eq!(config.polling.activity_limit, 10);
        assert_eq!(config.polling.files_limit, 50);
        assert_eq!(config.stages.structured_storing_ms, 100);
        assert_eq!(config.stages.accept_delay_ms, 500);
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "notification_timeout_secs = 8").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.notification_timeout(), Duration::from_secs(8));
    }

    #[test]
    fn zero_cadence_is_rejected() {
        let err = AppConfig::from_toml("[polling]\nhealth_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroCadence("health_secs")));

        let err = AppConfig::from_toml("[polling]\nfiles_secs = 0").unwrap_err();
        assert_eq!(err.to_string(), "Polling cadence `polling.files_secs` must be at least 1 second");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = AppConfig::from_toml("polling = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
