//! End-to-end backup runs against the mocked clickhouse-backup API

use crate::common::target_for;
use backup_scheduler::managers::backup::{BackupOrchestrator, OrchestratorOptions, RunError};
use httpmock::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use test_utils::{fast_orchestrator, in_progress_body, success_body, RunContext, SAMPLE_BACKUP};

#[test]
fn test_full_backup_run() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST).path("/backup/create").query_param("name", SAMPLE_BACKUP);
        then.status(200);
    });
    let status = server.mock(|when, then| {
        when.method(GET).path("/backup/status").query_param("name", SAMPLE_BACKUP);
        then.status(200).body(success_body(SAMPLE_BACKUP));
    });
    let upload = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/backup/upload/{}", SAMPLE_BACKUP))
            .query_param("name", SAMPLE_BACKUP);
        then.status(200);
    });

    let orchestrator = fast_orchestrator(Arc::new(target_for(&server, "")));
    let report = orchestrator
        .run_named(&RunContext::background(), SAMPLE_BACKUP)
        .unwrap();

    create.assert();
    status.assert();
    upload.assert();
    assert_eq!(report.name, SAMPLE_BACKUP);
    assert_eq!(report.status_checks, 1);
}

#[test]
fn test_run_polls_until_success() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/backup/create");
        then.status(200);
    });
    let mut pending = server.mock(|when, then| {
        when.method(GET).path("/backup/status");
        then.status(200).body(in_progress_body(SAMPLE_BACKUP));
    });
    let upload = server.mock(|when, then| {
        when.method(POST).path(format!("/backup/upload/{}", SAMPLE_BACKUP));
        then.status(200);
    });

    let orchestrator = BackupOrchestrator::new(
        Arc::new(target_for(&server, "")),
        OrchestratorOptions {
            poll_interval: Duration::from_millis(50),
            poll_timeout: None,
        },
    );
    let run = thread::spawn(move || orchestrator.run_named(&RunContext::background(), SAMPLE_BACKUP));

    let deadline = Instant::now() + Duration::from_secs(10);
    while pending.hits() < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(upload.hits(), 0, "upload must wait for success");

    pending.delete();
    server.mock(|when, then| {
        when.method(GET).path("/backup/status");
        then.status(200).body(success_body(SAMPLE_BACKUP));
    });

    let report = run.join().unwrap().unwrap();
    assert!(report.status_checks >= 3);
    upload.assert();
}

#[test]
fn test_create_failure_stops_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/backup/create");
        then.status(500).body("disk full");
    });
    let status = server.mock(|when, then| {
        when.method(GET).path("/backup/status");
        then.status(200).body(success_body(SAMPLE_BACKUP));
    });

    let orchestrator = fast_orchestrator(Arc::new(target_for(&server, "")));
    let err = orchestrator
        .run_named(&RunContext::background(), SAMPLE_BACKUP)
        .unwrap_err();

    assert!(matches!(err, RunError::Create { .. }));
    assert!(err.to_string().contains("disk full"));
    assert_eq!(status.hits(), 0);
}

#[test]
fn test_upload_failure_is_returned() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/backup/create");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(GET).path("/backup/status");
        then.status(200).body(success_body(SAMPLE_BACKUP));
    });
    server.mock(|when, then| {
        when.method(POST).path(format!("/backup/upload/{}", SAMPLE_BACKUP));
        then.status(404).body("backup not found on remote");
    });

    let orchestrator = fast_orchestrator(Arc::new(target_for(&server, "")));
    let err = orchestrator
        .run_named(&RunContext::background(), SAMPLE_BACKUP)
        .unwrap_err();

    assert!(matches!(err, RunError::Upload { .. }));
    assert_eq!(err.backup_name(), SAMPLE_BACKUP);
}

#[test]
fn test_poll_timeout_gives_up() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/backup/create");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(GET).path("/backup/status");
        then.status(200).body(in_progress_body(SAMPLE_BACKUP));
    });
    let upload = server.mock(|when, then| {
        when.method(POST).path(format!("/backup/upload/{}", SAMPLE_BACKUP));
        then.status(200);
    });

    let orchestrator = BackupOrchestrator::new(
        Arc::new(target_for(&server, "")),
        OrchestratorOptions {
            poll_interval: Duration::from_millis(20),
            poll_timeout: Some(Duration::from_millis(200)),
        },
    );
    let err = orchestrator
        .run_named(&RunContext::background(), SAMPLE_BACKUP)
        .unwrap_err();

    assert!(matches!(err, RunError::PollTimeout { .. }));
    assert_eq!(upload.hits(), 0);
}
