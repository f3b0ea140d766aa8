use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::EmptyPeriodPolicy;

/// Application-level constants
pub const APP_NAME: &str = "MedRemind";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minutes after the scheduled time before an unacknowledged dose is missed.
pub const DEFAULT_GRACE_PERIOD_MINUTES: u32 = 30;
/// Renewal is flagged when remaining doses drop to this count.
pub const DEFAULT_REFILL_THRESHOLD: u32 = 5;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tunables for the reminder pipeline. Every field has a default, so a
/// partial JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub grace_period_minutes: u32,
    pub empty_period_policy: EmptyPeriodPolicy,
    pub week_start: Weekday,
    pub poll_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            grace_period_minutes: DEFAULT_GRACE_PERIOD_MINUTES,
            empty_period_policy: EmptyPeriodPolicy::Perfect,
            week_start: Weekday::Mon,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl ScheduleConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults when the file does not exist; any other failure is returned.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

/// Get the application data directory
/// ~/MedRemind/ on all platforms
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// SQLite database holding medications, dose events and renewals
pub fn database_path() -> PathBuf {
    app_data_dir().join("reminders.db")
}

pub fn config_path() -> PathBuf {
    app_data_dir().join("config.json")
}

/// Log filter used when RUST_LOG is unset
pub fn default_log_filter() -> &'static str {
    "medremind=info,warn"
}
