//! Test fixtures and sample data
//!
//! Sample clickhouse-backup status bodies and config templates.

/// Backup name used across fixtures
pub const SAMPLE_BACKUP: &str = "2024-01-02T00:00";

/// One status record as served by `GET /backup/status`
pub fn status_line(command: &str, status: &str) -> String {
    format!(
        r#"{{"command":"{}","status":"{}","start":"2024-01-02 00:00:01"}}"#,
        command, status
    )
}

/// Newline-delimited status body for `name` with the given create status,
/// preceded by an older unrelated backup
pub fn status_body(name: &str, create_status: &str) -> String {
    [
        status_line("create 2024-01-01T00:00", "success"),
        status_line("upload 2024-01-01T00:00", "success"),
        status_line(&format!("create {}", name), create_status),
    ]
    .join("\n")
        + "\n"
}

/// Status body in which `name` is still being created
pub fn in_progress_body(name: &str) -> String {
    status_body(name, "in progress")
}

/// Status body in which `name` has been created
pub fn success_body(name: &str) -> String {
    status_body(name, "success")
}

/// Status body that knows nothing about `name`
pub fn unrelated_body() -> String {
    status_line("create 2023-12-31T00:00", "success") + "\n"
}

/// Minimal valid config TOML
pub fn minimal_config_toml() -> &'static str {
    r#"
[backup]
endpoint = "http://localhost:7171"
schedule = "0 0 * * *"
"#
}

/// Full config TOML with every setting present
pub fn full_config_toml() -> &'static str {
    r#"
[backup]
endpoint = "http://clickhouse-backup:7171"
schedule = "30 2 * * 1-5"
poll_interval_seconds = 10
poll_timeout_seconds = 3600
request_timeout_seconds = 30
lock_directory = "/var/lock"

[logging]
level = "debug"
directory = "/var/log/backup-scheduler"
max_files = 3
"#
}
