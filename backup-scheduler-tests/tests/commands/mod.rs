//! Command tests for backup-scheduler
//!
//! These tests verify the behavior behind each CLI command using the mock target.

mod clickhouse;
mod targets;
