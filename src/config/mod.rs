//! Configuration module for backup-scheduler
//!
//! This module handles loading, validating and overriding configuration.
//!
//! ## Configuration Precedence
//!
//! Settings are applied in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. TOML config file (if `--config` is given)
//! 3. Command-line flags
//!
//! ## Example Usage
//!
//! ```no_run
//! use backup_scheduler::config;
//!
//! let config = config::load_config("backup-scheduler.toml")?;
//! println!("Endpoint: {}, schedule: {}", config.backup.endpoint, config.backup.schedule);
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{
    load_config, parse_endpoint, parse_schedule, read_config, validate_config, ConfigError, Result,
};
pub use types::*;

use std::path::PathBuf;

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub schedule: Option<String>,
    pub poll_interval_seconds: Option<u64>,
    pub poll_timeout_seconds: Option<u64>,
    pub log_level: Option<String>,
    pub log_directory: Option<PathBuf>,
}

impl Config {
    /// Apply command-line overrides and re-validate
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(endpoint) = overrides.endpoint {
            self.backup.endpoint = endpoint;
        }
        if let Some(schedule) = overrides.schedule {
            self.backup.schedule = schedule;
        }
        if let Some(interval) = overrides.poll_interval_seconds {
            self.backup.poll_interval_seconds = interval;
        }
        if let Some(timeout) = overrides.poll_timeout_seconds {
            self.backup.poll_timeout_seconds = timeout;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(directory) = overrides.log_directory {
            self.logging.directory = Some(directory);
        }

        validate_config(&self)?;
        Ok(self)
    }
}

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
