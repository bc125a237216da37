//! Backup Scheduler Library
//!
//! This library drives periodic backups through a remote backup-management
//! API: create a named backup, poll its status until it succeeds, then upload it.

pub mod config;
pub mod managers;
pub mod targets;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, Config, ConfigError};
pub use managers::backup::{BackupOrchestrator, OrchestratorOptions, RunError, RunReport};
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use managers::scheduler::{BackupJob, JobOutcome, Scheduler};
pub use targets::{BackupStatus, BackupTarget, TargetError, TargetRegistry, TargetSettings};
pub use utils::context::{CancelToken, RunContext};
