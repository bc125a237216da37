use super::types::*;
use crate::utils::cron::{CronParseError, CronSchedule};
use reqwest::Url;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid backup endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid backup schedule '{schedule}': {source}")]
    InvalidSchedule {
        schedule: String,
        #[source]
        source: CronParseError,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown backup target '{0}'")]
    UnknownTarget(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = read_config(path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Read and parse a TOML config file without validating it
///
/// Used when command-line overrides are applied afterwards; see
/// `Config::with_overrides`, which validates the merged result.
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> Result<()> {
    parse_endpoint(&config.backup.endpoint)?;
    parse_schedule(&config.backup.schedule)?;

    if config.backup.poll_interval_seconds == 0 {
        return Err(ConfigError::ValidationError(
            "poll_interval_seconds must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Parse the backup API endpoint, accepting only absolute http(s) URLs
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::InvalidEndpoint(format!(
                "{}: unsupported scheme '{}'",
                endpoint, other
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEndpoint(format!("{}: missing host", endpoint)));
    }

    Ok(url)
}

/// Parse the backup schedule
pub fn parse_schedule(schedule: &str) -> Result<CronSchedule> {
    CronSchedule::parse(schedule).map_err(|source| ConfigError::InvalidSchedule {
        schedule: schedule.to_string(),
        source,
    })
}
