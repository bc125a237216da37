//! Fluent API for building test configurations
//!
//! Provides a builder pattern for creating test configurations with sensible defaults.

use backup_scheduler::config::{BackupSettings, Config, LoggingSettings};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct ConfigBuilder {
    temp_dir: TempDir,
    backup: BackupSettings,
    logging: LoggingSettings,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder with defaults, locks and logs inside a temp dir
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let lock_directory = temp_dir.path().join("locks");
        fs::create_dir_all(&lock_directory).expect("Failed to create lock directory");

        let backup = BackupSettings {
            lock_directory,
            ..BackupSettings::default()
        };

        Self {
            temp_dir,
            backup,
            logging: LoggingSettings::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.backup.endpoint = endpoint.to_string();
        self
    }

    pub fn schedule(mut self, schedule: &str) -> Self {
        self.backup.schedule = schedule.to_string();
        self
    }

    pub fn poll_interval(mut self, seconds: u64) -> Self {
        self.backup.poll_interval_seconds = seconds;
        self
    }

    pub fn poll_timeout(mut self, seconds: u64) -> Self {
        self.backup.poll_timeout_seconds = seconds;
        self
    }

    pub fn request_timeout(mut self, seconds: u64) -> Self {
        self.backup.request_timeout_seconds = seconds;
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.logging.level = level.to_string();
        self
    }

    /// Write log files into `logs/` under the temp dir
    pub fn with_log_directory(mut self) -> Self {
        self.logging.directory = Some(self.temp_dir.path().join("logs"));
        self
    }

    /// Build the config, dropping the temp dir
    pub fn build(self) -> Config {
        Config {
            backup: self.backup,
            logging: self.logging,
        }
    }

    /// Build the config and keep its temp dir alive
    pub fn persist(self) -> (Config, TempDir) {
        let config = Config {
            backup: self.backup,
            logging: self.logging,
        };
        (config, self.temp_dir)
    }

    /// Serialize the config to `config.toml` in the temp dir
    pub fn write(self) -> (PathBuf, TempDir) {
        let (config, temp_dir) = self.persist();
        let path = temp_dir.path().join("config.toml");
        let contents = toml::to_string_pretty(&config).expect("Failed to serialize config");
        fs::write(&path, contents).expect("Failed to write config file");
        (path, temp_dir)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
