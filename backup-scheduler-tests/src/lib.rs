//! Test utilities for backup-scheduler
//!
//! This crate provides shared test utilities, fixtures and re-exported
//! mock implementations for testing the backup-scheduler application.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{ConfigBuilder, MockTarget, TestContext};
//!
//! #[test]
//! fn my_test() {
//!     let ctx = TestContext::from_builder(ConfigBuilder::new().schedule("*/5 * * * *"));
//!     let target = MockTarget::new().succeeding_after(2);
//!     // ... test code
//! }
//! ```

pub mod config_builder;
pub mod fixtures;
pub mod test_context;

// Re-export commonly used items
pub use config_builder::ConfigBuilder;
pub use fixtures::*;
pub use test_context::TestContext;

// Re-export types from the main crate for convenience
pub use backup_scheduler::config::{BackupSettings, Config, ConfigOverrides, LoggingSettings};
pub use backup_scheduler::managers::backup::{BackupOrchestrator, OrchestratorOptions};
pub use backup_scheduler::utils::context::{CancelToken, RunContext};

// Re-export mock implementations from the main crate
pub use backup_scheduler::targets::mock::{MockTarget, StatusResponse, TargetCall};
pub use backup_scheduler::targets::BackupTarget;

use std::sync::Arc;
use std::time::Duration;

/// Common test result type
pub type TestResult<T = ()> = anyhow::Result<T>;

/// Orchestrator over `target` with a short poll interval suitable for tests
pub fn fast_orchestrator(target: Arc<dyn BackupTarget>) -> BackupOrchestrator {
    BackupOrchestrator::new(
        target,
        OrchestratorOptions {
            poll_interval: Duration::from_millis(10),
            poll_timeout: None,
        },
    )
}
