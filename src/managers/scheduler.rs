//! Recurring schedule runner and the backup job it triggers
//!
//! The scheduler runs its job synchronously on the calling thread, so two
//! ticks never execute concurrently. Ticks that fall inside a running job are
//! skipped. `BackupJob` additionally takes a file lock per target endpoint so
//! separate daemons pointed at the same API do not overlap either.

use crate::managers::backup::{BackupOrchestrator, RunError, RunReport};
use crate::utils::context::{CancelToken, RunContext};
use crate::utils::cron::CronSchedule;
use crate::utils::locker::{LockError, RunLock};
use chrono::{DateTime, Local};
use reqwest::Url;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Result of one triggered job
#[derive(Debug)]
pub enum JobOutcome {
    Completed(RunReport),
    Failed(RunError),
    /// Another run held the lock
    Skipped,
}

/// Runs a job on every tick of a cron schedule until cancelled
pub struct Scheduler {
    schedule: CronSchedule,
    token: CancelToken,
}

impl Scheduler {
    pub fn new(schedule: CronSchedule, token: CancelToken) -> Self {
        Self { schedule, token }
    }

    pub fn schedule(&self) -> &CronSchedule {
        &self.schedule
    }

    /// Block, invoking `job` on each tick; returns the number of ticks run
    /// once the token is cancelled or the schedule has no further ticks
    pub fn run<F>(&self, mut job: F) -> u64
    where
        F: FnMut(&RunContext),
    {
        let ctx = RunContext::with_token(self.token.clone());
        let mut ticks = 0;
        let mut after = Local::now();

        info!("Scheduler started with schedule '{}'", self.schedule);

        'schedule: loop {
            let Some(next) = self.schedule.next_after(after) else {
                warn!("Schedule '{}' has no upcoming ticks, stopping", self.schedule);
                break;
            };

            info!("Next backup scheduled at {}", next.format("%Y-%m-%d %H:%M:%S %Z"));

            // Re-check the wall clock in case it moved while we slept
            while Local::now() < next {
                if ctx.sleep(until(next)).is_err() {
                    break 'schedule;
                }
            }

            debug!("Tick at {}", next);
            job(&ctx);
            ticks += 1;

            let finished = Local::now();
            let skipped = self.missed_ticks(next, finished);
            if skipped > 0 {
                warn!(
                    "Job ran past {} scheduled tick(s); they were skipped",
                    skipped
                );
            }
            after = finished.max(next);

            if self.token.is_cancelled() {
                break;
            }
        }

        info!("Scheduler stopped after {} ticks", ticks);
        ticks
    }

    /// Ticks strictly between `tick` and `finished`
    fn missed_ticks(&self, tick: DateTime<Local>, finished: DateTime<Local>) -> usize {
        self.schedule
            .upcoming(tick)
            .take_while(|t| *t <= finished)
            .count()
    }
}

fn until(at: DateTime<Local>) -> std::time::Duration {
    (at - Local::now()).to_std().unwrap_or_default()
}

/// Run lock key for backups of `kind` through the API at `endpoint`
pub fn endpoint_lock_key(kind: &str, endpoint: &Url) -> String {
    format!("{}@{}", kind, endpoint)
}

/// Scheduled callback: one orchestrator run guarded by a run lock
pub struct BackupJob {
    orchestrator: BackupOrchestrator,
    lock_dir: PathBuf,
    lock_key: String,
}

impl BackupJob {
    pub fn new(orchestrator: BackupOrchestrator, lock_dir: PathBuf) -> Self {
        let lock_key = orchestrator.target().kind().to_string();
        Self {
            orchestrator,
            lock_dir,
            lock_key,
        }
    }

    /// Use a custom lock key, see [`endpoint_lock_key`]
    pub fn with_lock_key(mut self, key: impl Into<String>) -> Self {
        self.lock_key = key.into();
        self
    }

    pub fn orchestrator(&self) -> &BackupOrchestrator {
        &self.orchestrator
    }

    /// Run one backup unless another run holds the lock
    /// Failures are logged and returned as `JobOutcome::Failed`
    pub fn execute(&self, ctx: &RunContext) -> JobOutcome {
        let _lock = match RunLock::try_acquire(&self.lock_dir, &self.lock_key) {
            Ok(lock) => lock,
            Err(LockError::AlreadyHeld { key, .. }) => {
                warn!("Backup for '{}' still running, skipping this tick", key);
                return JobOutcome::Skipped;
            }
            Err(e) => {
                // Without a usable lock directory we still back up
                warn!("Failed to take run lock, continuing without it: {}", e);
                return self.run_unlocked(ctx);
            }
        };

        self.run_unlocked(ctx)
    }

    fn run_unlocked(&self, ctx: &RunContext) -> JobOutcome {
        match self.orchestrator.run(ctx) {
            Ok(report) => {
                info!(
                    "Backup '{}' completed after {} status check(s)",
                    report.name, report.status_checks
                );
                JobOutcome::Completed(report)
            }
            Err(e) => {
                error!("Backup run failed: {}", e);
                JobOutcome::Failed(e)
            }
        }
    }
}
