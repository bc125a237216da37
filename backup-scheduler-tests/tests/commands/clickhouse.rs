//! Tests for the 'clickhouse' command
//!
//! The command wires the registry-built target into an orchestrator and runs
//! it as a locked `BackupJob`, either once or on every scheduler tick.

use backup_scheduler::managers::backup::RunError;
use backup_scheduler::managers::scheduler::{BackupJob, JobOutcome, Scheduler};
use backup_scheduler::utils::cron::CronSchedule;
use backup_scheduler::utils::locker::RunLock;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use test_utils::{
    fast_orchestrator, CancelToken, ConfigBuilder, MockTarget, RunContext, StatusResponse,
    TargetCall, TestContext,
};

fn job(ctx: &TestContext, mock: &MockTarget) -> BackupJob {
    BackupJob::new(fast_orchestrator(Arc::new(mock.clone())), ctx.lock_dir())
}

#[test]
fn test_once_runs_full_lifecycle() {
    let ctx = TestContext::from_builder(ConfigBuilder::new());
    let mock = MockTarget::new().succeeding_after(2);

    let outcome = job(&ctx, &mock).execute(&RunContext::background());

    let report = match outcome {
        JobOutcome::Completed(report) => report,
        other => panic!("expected completed run, got {:?}", other),
    };
    assert_eq!(report.status_checks, 3);

    let calls = mock.get_calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0], TargetCall::Create { name: report.name.clone() });
    assert_eq!(calls[4], TargetCall::Upload { name: report.name.clone() });
}

#[test]
fn test_once_create_failure_skips_status_and_upload() {
    let ctx = TestContext::from_builder(ConfigBuilder::new());
    let mock = MockTarget::new().with_failing_create();

    let outcome = job(&ctx, &mock).execute(&RunContext::background());

    assert!(matches!(outcome, JobOutcome::Failed(RunError::Create { .. })));
    assert_eq!(mock.status_count(), 0);
    assert_eq!(mock.upload_count(), 0);
}

#[test]
fn test_once_status_errors_are_retried() {
    let ctx = TestContext::from_builder(ConfigBuilder::new());
    let mock = MockTarget::new().with_statuses(vec![
        StatusResponse::Error("connection refused".to_string()),
        StatusResponse::NotFound,
        StatusResponse::success(),
    ]);

    let outcome = job(&ctx, &mock).execute(&RunContext::background());

    assert!(matches!(outcome, JobOutcome::Completed(_)));
    assert_eq!(mock.status_count(), 3);
    assert_eq!(mock.upload_count(), 1);
}

#[test]
fn test_upload_failure_is_reported() {
    let ctx = TestContext::from_builder(ConfigBuilder::new());
    let mock = MockTarget::new().with_failing_upload();

    let outcome = job(&ctx, &mock).execute(&RunContext::background());

    match outcome {
        JobOutcome::Failed(err @ RunError::Upload { .. }) => {
            assert_eq!(mock.upload_count(), 1);
            assert!(!err.backup_name().is_empty());
        }
        other => panic!("expected upload failure, got {:?}", other),
    }
}

#[test]
fn test_concurrent_run_is_skipped() {
    let ctx = TestContext::from_builder(ConfigBuilder::new());
    let mock = MockTarget::new();
    let job = job(&ctx, &mock);

    let _running = RunLock::try_acquire(&ctx.lock_dir(), "mock").unwrap();

    assert!(matches!(job.execute(&RunContext::background()), JobOutcome::Skipped));
    assert!(mock.get_calls().is_empty());
}

#[test]
fn test_shutdown_interrupts_polling() {
    let ctx = TestContext::from_builder(ConfigBuilder::new());
    let mock = MockTarget::new().with_fallback_status(StatusResponse::in_progress());
    let job = job(&ctx, &mock);

    let token = CancelToken::new();
    let canceller = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            token.cancel();
        })
    };

    let outcome = job.execute(&RunContext::with_token(token));
    canceller.join().unwrap();

    assert!(matches!(outcome, JobOutcome::Failed(RunError::Cancelled { .. })));
    assert_eq!(mock.upload_count(), 0);
}

#[test]
fn test_scheduler_exits_on_shutdown() {
    let token = CancelToken::new();
    let scheduler = Scheduler::new(CronSchedule::parse("@yearly").unwrap(), token.clone());

    let handle = thread::spawn(move || scheduler.run(|_| {}));
    thread::sleep(Duration::from_millis(50));
    token.cancel();

    assert_eq!(handle.join().unwrap(), 0);
}
