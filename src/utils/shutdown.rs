//! Signal handling for graceful daemon shutdown

use crate::utils::context::CancelToken;
use anyhow::{Context, Result};
use std::thread;
use tracing::{debug, info, warn};

/// Cancel `token` when the process receives Ctrl-C (or SIGTERM on unix)
///
/// Signals are awaited on a dedicated thread running a small tokio runtime so
/// the rest of the daemon can stay synchronous. The thread exits early if the
/// token is cancelled elsewhere.
pub fn install(token: CancelToken) -> Result<thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal handling runtime")?;

    thread::Builder::new()
        .name("shutdown-signals".to_string())
        .spawn(move || {
            runtime.block_on(async {
                tokio::select! {
                    signal = wait_for_signal() => match signal {
                        Ok(signal) => {
                            info!("Received {}, shutting down", signal);
                            token.cancel();
                        }
                        Err(e) => warn!("Failed to listen for shutdown signals: {}", e),
                    },
                    _ = token.cancelled() => debug!("Token cancelled, signal listener stopping"),
                }
            })
        })
        .context("Failed to spawn signal handling thread")
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "Ctrl-C")
}
