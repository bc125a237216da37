use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Backup target and scheduling settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BackupSettings {
    /// Backup-management API endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Backup schedule in cron notation
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Delay between status checks
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Maximum time spent polling for success (0 = unbounded)
    #[serde(default)]
    pub poll_timeout_seconds: u64,

    /// Per-request HTTP timeout (0 = no timeout)
    #[serde(default)]
    pub request_timeout_seconds: u64,

    /// Directory holding the run lock files
    #[serde(default = "default_lock_directory")]
    pub lock_directory: PathBuf,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            schedule: default_schedule(),
            poll_interval_seconds: default_poll_interval(),
            poll_timeout_seconds: 0,
            request_timeout_seconds: 0,
            lock_directory: default_lock_directory(),
        }
    }
}

impl BackupSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// `None` when polling is unbounded
    pub fn poll_timeout(&self) -> Option<Duration> {
        non_zero_seconds(self.poll_timeout_seconds)
    }

    /// `None` when requests have no timeout
    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero_seconds(self.request_timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rotated log files; console-only logging when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_log_max_files")]
    pub max_files: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            max_files: default_log_max_files(),
        }
    }
}

fn non_zero_seconds(seconds: u64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

// Default value functions
fn default_endpoint() -> String {
    "http://localhost:7171".to_string()
}

fn default_schedule() -> String {
    "0 0 * * *".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_lock_directory() -> PathBuf {
    std::env::temp_dir()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_max_files() -> u32 {
    10
}
