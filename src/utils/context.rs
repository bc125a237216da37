//! Cancellation and deadline context passed to every target call
//!
//! A `CancelToken` is shared between the shutdown handler, the scheduler and
//! in-flight backup runs. `RunContext` pairs a token with an optional deadline.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Returned when a wait was interrupted by cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Shared cancellation flag that can wake sleeping waiters
///
/// Wraps a tokio `CancellationToken` so the signal handler can await it while
/// the synchronous scheduler and orchestrator block on it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token and wake every waiter
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        self.inner.cancelled().await
    }

    /// Block for up to `duration`, returning early with `Err(Cancelled)` if
    /// the token is cancelled before or during the wait
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait_timeout(&self, duration: Duration) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to build timer runtime, sleeping without wake-up: {}", e);
                std::thread::sleep(duration);
                return if self.is_cancelled() { Err(Cancelled) } else { Ok(()) };
            }
        };

        runtime.block_on(async {
            match tokio::time::timeout(duration, self.inner.cancelled()).await {
                Ok(()) => Err(Cancelled),
                Err(_elapsed) => Ok(()),
            }
        })
    }
}

/// Execution context for a single target call or a whole run
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    token: CancelToken,
    deadline: Option<Instant>,
}

impl RunContext {
    /// Context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Context bound to an existing cancellation token
    pub fn with_token(token: CancelToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a context whose deadline is at most `timeout` from now
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };

        Self {
            token: self.token.clone(),
            deadline: Some(deadline),
        }
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// True once the token is cancelled or the deadline has passed
    pub fn is_cancelled(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    /// Time left until the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Sleep for `duration`, waking early on cancellation or deadline expiry
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let wait = match self.remaining() {
            Some(remaining) if remaining < duration => {
                self.token.wait_timeout(remaining)?;
                return Err(Cancelled);
            }
            _ => duration,
        };

        self.token.wait_timeout(wait)
    }
}
