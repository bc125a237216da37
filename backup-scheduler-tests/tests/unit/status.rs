//! Unit tests for clickhouse-backup status body decoding

use backup_scheduler::targets::clickhouse::{latest_status, status_records};
use backup_scheduler::targets::TargetError;
use std::io::Cursor;
use test_utils::{in_progress_body, status_line, success_body, unrelated_body, SAMPLE_BACKUP};

fn status_of(body: &str, name: &str) -> Result<String, TargetError> {
    latest_status(status_records(Cursor::new(body.as_bytes())), name).map(|s| s.as_str().to_string())
}

#[test]
fn test_status_in_progress() {
    let status = status_of(&in_progress_body(SAMPLE_BACKUP), SAMPLE_BACKUP).unwrap();
    assert_eq!(status, "in progress");
}

#[test]
fn test_status_success() {
    let body = success_body(SAMPLE_BACKUP);
    let status = latest_status(status_records(Cursor::new(body.as_bytes())), SAMPLE_BACKUP).unwrap();
    assert!(status.is_success());
}

#[test]
fn test_status_unknown_backup_is_not_found() {
    let err = status_of(&unrelated_body(), SAMPLE_BACKUP).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_status_empty_body_is_not_found() {
    assert!(status_of("", SAMPLE_BACKUP).unwrap_err().is_not_found());
}

#[test]
fn test_status_last_matching_record_wins() {
    let body = [
        status_line(&format!("create {}", SAMPLE_BACKUP), "error"),
        status_line(&format!("create {}", SAMPLE_BACKUP), "in progress"),
        status_line(&format!("create {}", SAMPLE_BACKUP), "success"),
    ]
    .join("\n");

    assert_eq!(status_of(&body, SAMPLE_BACKUP).unwrap(), "success");
}

#[test]
fn test_status_ignores_other_commands_for_same_name() {
    let body = [
        status_line(&format!("create {}", SAMPLE_BACKUP), "success"),
        status_line(&format!("upload {}", SAMPLE_BACKUP), "in progress"),
    ]
    .join("\n");

    assert_eq!(status_of(&body, SAMPLE_BACKUP).unwrap(), "success");
}

#[test]
fn test_status_matches_whole_name() {
    // "create 2024-01-02T00:00" must not match a backup named "2024-01-02T00"
    let err = status_of(&success_body(SAMPLE_BACKUP), "2024-01-02T00").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_status_empty_status_is_not_found() {
    let body = format!(r#"{{"command":"create {}"}}"#, SAMPLE_BACKUP);
    assert!(status_of(&body, SAMPLE_BACKUP).unwrap_err().is_not_found());
}

#[test]
fn test_status_malformed_line_is_decode_error() {
    let body = format!("{}\nnot json\n", status_line("create other", "success"));
    let err = status_of(&body, SAMPLE_BACKUP).unwrap_err();
    assert!(matches!(err, TargetError::Decode { .. }));
}
