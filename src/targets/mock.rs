//! Scripted in-memory target for tests
//!
//! Records every call in order and replays a queue of status responses.
//! Available for use in external test crates.

use super::{BackupStatus, BackupTarget, TargetError};
use crate::utils::context::RunContext;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Recorded target call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetCall {
    Create { name: String },
    Status { name: String },
    Upload { name: String },
}

/// Scripted response for one status call
#[derive(Clone, Debug)]
pub enum StatusResponse {
    Status(String),
    NotFound,
    Error(String),
}

impl StatusResponse {
    pub fn success() -> Self {
        StatusResponse::Status(super::SUCCESS_STATUS.to_string())
    }

    pub fn in_progress() -> Self {
        StatusResponse::Status("in progress".to_string())
    }
}

/// Mock target for testing
#[derive(Clone, Default)]
pub struct MockTarget {
    /// Recorded calls, in order
    pub calls: Arc<Mutex<Vec<TargetCall>>>,
    /// Status responses consumed one per call; once empty, `fallback_status` is used
    status_script: Arc<Mutex<VecDeque<StatusResponse>>>,
    fallback_status: Arc<Mutex<Option<StatusResponse>>>,
    /// Whether create should fail
    should_fail_create: Arc<Mutex<bool>>,
    /// Whether upload should fail
    should_fail_upload: Arc<Mutex<bool>>,
}

impl MockTarget {
    /// Mock whose backups succeed on the first status check
    pub fn new() -> Self {
        Self {
            fallback_status: Arc::new(Mutex::new(Some(StatusResponse::success()))),
            ..Default::default()
        }
    }

    /// Replace the status script
    pub fn with_statuses(self, statuses: Vec<StatusResponse>) -> Self {
        *self.status_script.lock().unwrap() = statuses.into();
        self
    }

    /// Report success after `pending` in-progress checks
    pub fn succeeding_after(self, pending: usize) -> Self {
        let mut script = vec![StatusResponse::in_progress(); pending];
        script.push(StatusResponse::success());
        self.with_statuses(script)
    }

    /// Response returned once the script is exhausted
    pub fn with_fallback_status(self, response: StatusResponse) -> Self {
        *self.fallback_status.lock().unwrap() = Some(response);
        self
    }

    /// Configure create to fail
    pub fn with_failing_create(self) -> Self {
        *self.should_fail_create.lock().unwrap() = true;
        self
    }

    /// Configure upload to fail
    pub fn with_failing_upload(self) -> Self {
        *self.should_fail_upload.lock().unwrap() = true;
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<TargetCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, TargetCall::Create { .. }))
    }

    pub fn status_count(&self) -> usize {
        self.count(|c| matches!(c, TargetCall::Status { .. }))
    }

    pub fn upload_count(&self) -> usize {
        self.count(|c| matches!(c, TargetCall::Upload { .. }))
    }

    fn count(&self, predicate: impl Fn(&TargetCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: TargetCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_status(&self) -> StatusResponse {
        self.status_script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback_status.lock().unwrap().clone())
            .unwrap_or_else(StatusResponse::in_progress)
    }
}

impl BackupTarget for MockTarget {
    fn kind(&self) -> &'static str {
        "mock"
    }

    fn create(&self, ctx: &RunContext, name: &str) -> Result<(), TargetError> {
        self.record(TargetCall::Create { name: name.to_string() });

        if ctx.is_cancelled() {
            return Err(TargetError::Cancelled { operation: "mock create" });
        }
        if *self.should_fail_create.lock().unwrap() {
            return Err(TargetError::Http {
                operation: "mock create",
                status: 500,
                body: "create failed".to_string(),
            });
        }
        Ok(())
    }

    fn status(&self, _ctx: &RunContext, name: &str) -> Result<BackupStatus, TargetError> {
        self.record(TargetCall::Status { name: name.to_string() });

        match self.next_status() {
            StatusResponse::Status(status) => Ok(BackupStatus::new(status)),
            StatusResponse::NotFound => Err(TargetError::NotFound { name: name.to_string() }),
            StatusResponse::Error(message) => Err(TargetError::Transport {
                operation: "mock status",
                message,
            }),
        }
    }

    fn upload(&self, _ctx: &RunContext, name: &str) -> Result<(), TargetError> {
        self.record(TargetCall::Upload { name: name.to_string() });

        if *self.should_fail_upload.lock().unwrap() {
            return Err(TargetError::Http {
                operation: "mock upload",
                status: 502,
                body: "upload failed".to_string(),
            });
        }
        Ok(())
    }
}
