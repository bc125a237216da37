//! Backup target abstraction
//!
//! A target is a remote backup-management service that can create a named
//! backup, report its status and upload it to long-term storage. Concrete
//! adapters are registered in a [`TargetRegistry`] by kind.

pub mod clickhouse;
pub mod mock;

use crate::config::ConfigError;
use crate::utils::context::RunContext;
use reqwest::Url;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Status value that marks a backup as fully created on the target
pub const SUCCESS_STATUS: &str = "success";

/// Errors returned by target adapters
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("failed to make {operation} request: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} request failed with status code {status} and body: \"{body}\"")]
    Http {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("backup '{name}' not found in target status response")]
    NotFound { name: String },

    #[error("failed to decode {operation} response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} request cancelled")]
    Cancelled { operation: &'static str },
}

impl TargetError {
    /// True when the target has no record of the backup
    pub fn is_not_found(&self) -> bool {
        matches!(self, TargetError::NotFound { .. })
    }
}

/// Backup status as reported by the target
///
/// Only [`SUCCESS_STATUS`] is meaningful; every other value means the backup
/// is still in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupStatus(String);

impl BackupStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn is_success(&self) -> bool {
        self.0 == SUCCESS_STATUS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability set every backup-management integration must provide
pub trait BackupTarget: Send + Sync {
    /// Target kind identifier (for logging and locking)
    fn kind(&self) -> &'static str;

    /// Ask the target to start producing a backup named `name`
    fn create(&self, ctx: &RunContext, name: &str) -> Result<(), TargetError>;

    /// Current status of backup `name`
    /// Returns `TargetError::NotFound` if the target has no record of it
    fn status(&self, ctx: &RunContext, name: &str) -> Result<BackupStatus, TargetError>;

    /// Persist the already-created backup `name` to long-term storage
    fn upload(&self, ctx: &RunContext, name: &str) -> Result<(), TargetError>;
}

/// Settings shared by all adapters
#[derive(Debug, Clone)]
pub struct TargetSettings {
    /// Base URL of the backup-management API
    pub endpoint: Url,
    /// Per-request timeout, `None` for no limit
    pub request_timeout: Option<Duration>,
}

impl TargetSettings {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Constructor for a concrete adapter
pub type TargetConstructor = fn(&TargetSettings) -> Result<Box<dyn BackupTarget>, ConfigError>;

/// Maps target kind identifiers to adapter constructors
#[derive(Clone, Default)]
pub struct TargetRegistry {
    constructors: BTreeMap<&'static str, TargetConstructor>,
}

impl TargetRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every adapter shipped in this crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(clickhouse::KIND, clickhouse::ClickhouseTarget::boxed);
        registry
    }

    /// Register (or replace) the constructor for `kind`
    pub fn register(&mut self, kind: &'static str, constructor: TargetConstructor) {
        self.constructors.insert(kind, constructor);
    }

    /// Build the adapter registered under `kind`
    pub fn build(
        &self,
        kind: &str,
        settings: &TargetSettings,
    ) -> Result<Box<dyn BackupTarget>, ConfigError> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| ConfigError::UnknownTarget(kind.to_string()))?;

        constructor(settings)
    }

    /// Registered kinds in sorted order
    pub fn kinds(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }
}
