//! Backup orchestrator - drives one backup through create, poll and upload

use crate::targets::{BackupTarget, TargetError};
use crate::utils::context::RunContext;
use chrono::{DateTime, Local, TimeZone};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Backup names are the run's start time at minute granularity
pub const BACKUP_NAME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Default delay between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Format the backup name for a run started at `at`
///
/// Two runs started within the same minute get the same name.
pub fn backup_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format(BACKUP_NAME_FORMAT).to_string()
}

/// Lifecycle state of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Created,
    Polling,
    Succeeded,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunState::Idle => "idle",
            RunState::Created => "created",
            RunState::Polling => "polling",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Terminal failure of a run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to create backup '{name}': {source}")]
    Create {
        name: String,
        #[source]
        source: TargetError,
    },

    #[error("failed to upload backup '{name}': {source}")]
    Upload {
        name: String,
        #[source]
        source: TargetError,
    },

    #[error("backup '{name}' did not succeed within {waited:?}")]
    PollTimeout { name: String, waited: Duration },

    #[error("backup '{name}' cancelled while waiting for success")]
    Cancelled { name: String },
}

impl RunError {
    /// Name of the backup the run was working on
    pub fn backup_name(&self) -> &str {
        match self {
            RunError::Create { name, .. }
            | RunError::Upload { name, .. }
            | RunError::PollTimeout { name, .. }
            | RunError::Cancelled { name } => name,
        }
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub name: String,
    /// Number of status calls made, including the one that returned success
    pub status_checks: u32,
    pub elapsed: Duration,
}

/// Orchestrator tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Delay between status checks
    pub poll_interval: Duration,
    /// Upper bound on time spent polling, `None` = wait forever
    pub poll_timeout: Option<Duration>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: None,
        }
    }
}

pub struct BackupOrchestrator {
    target: Arc<dyn BackupTarget>,
    options: OrchestratorOptions,
}

impl BackupOrchestrator {
    /// Create new orchestrator for `target`
    pub fn new(target: Arc<dyn BackupTarget>, options: OrchestratorOptions) -> Self {
        Self { target, options }
    }

    pub fn target(&self) -> &dyn BackupTarget {
        self.target.as_ref()
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Run a backup named after the current local time
    pub fn run(&self, ctx: &RunContext) -> Result<RunReport, RunError> {
        let name = backup_name(&Local::now());
        self.run_named(ctx, &name)
    }

    /// Drive backup `name` from creation to upload
    pub fn run_named(&self, ctx: &RunContext, name: &str) -> Result<RunReport, RunError> {
        let start_time = Instant::now();
        let mut state = RunState::Idle;

        info!(backup = %name, kind = self.target.kind(), "Starting backup");

        if let Err(e) = self.target.create(ctx, name) {
            transition(name, &mut state, RunState::Failed);
            error!(backup = %name, operation = "create", "Failed to create backup: {}", e);
            return Err(RunError::Create {
                name: name.to_string(),
                source: e,
            });
        }
        transition(name, &mut state, RunState::Created);

        transition(name, &mut state, RunState::Polling);
        let status_checks = match self.wait_for_success(ctx, name) {
            Ok(checks) => checks,
            Err(e) => {
                transition(name, &mut state, RunState::Failed);
                error!(backup = %name, operation = "status", "{}", e);
                return Err(e);
            }
        };
        transition(name, &mut state, RunState::Succeeded);

        if let Err(e) = self.target.upload(ctx, name) {
            transition(name, &mut state, RunState::Failed);
            error!(backup = %name, operation = "upload", "Failed to upload backup: {}", e);
            return Err(RunError::Upload {
                name: name.to_string(),
                source: e,
            });
        }

        let elapsed = start_time.elapsed();
        info!(
            backup = %name,
            status_checks,
            "Backup uploaded successfully in {:.2}s",
            elapsed.as_secs_f64()
        );

        Ok(RunReport {
            name: name.to_string(),
            status_checks,
            elapsed,
        })
    }

    /// Poll status until it reports success
    /// Status errors are logged and retried on the next tick
    fn wait_for_success(&self, ctx: &RunContext, name: &str) -> Result<u32, RunError> {
        let polling_started = Instant::now();
        let mut checks: u32 = 0;

        loop {
            checks += 1;
            match self.target.status(ctx, name) {
                Ok(status) => {
                    info!(backup = %name, status = %status, "Backup status check");
                    if status.is_success() {
                        return Ok(checks);
                    }
                }
                Err(e) if e.is_not_found() => {
                    warn!(backup = %name, "Backup not known to target yet: {}", e);
                }
                Err(e) => {
                    warn!(backup = %name, "Failed to get backup status: {}", e);
                }
            }

            let mut wait = self.options.poll_interval;
            if let Some(timeout) = self.options.poll_timeout {
                let waited = polling_started.elapsed();
                if waited >= timeout {
                    return Err(RunError::PollTimeout {
                        name: name.to_string(),
                        waited,
                    });
                }
                wait = wait.min(timeout - waited);
            }

            if ctx.sleep(wait).is_err() {
                return Err(RunError::Cancelled {
                    name: name.to_string(),
                });
            }
        }
    }
}

fn transition(name: &str, state: &mut RunState, next: RunState) {
    debug!(backup = %name, "Run state {} -> {}", state, next);
    *state = next;
}
