//! File-based locking to prevent overlapping backup runs

use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("backup run for '{key}' is already in progress (lock held: {path:?})")]
    AlreadyHeld { key: String, path: PathBuf },

    #[error("failed to open lock file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exclusive lock held for the duration of one backup run
///
/// The lock is released when the file handle is closed, i.e. when the
/// `RunLock` is dropped.
pub struct RunLock {
    _lock: RwLock<File>,
    lock_path: PathBuf,
}

impl RunLock {
    /// Try to acquire the lock for `key` without blocking
    /// Returns `LockError::AlreadyHeld` if another run holds it
    pub fn try_acquire(lock_dir: &Path, key: &str) -> Result<Self, LockError> {
        let lock_path = Self::lock_path(lock_dir, key);

        debug!("Attempting to acquire lock: {:?}", lock_path);

        std::fs::create_dir_all(lock_dir).map_err(|source| LockError::Io {
            path: lock_dir.to_path_buf(),
            source,
        })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| LockError::Io {
                path: lock_path.clone(),
                source,
            })?;

        let mut lock = RwLock::new(file);
        match lock.try_write() {
            Ok(guard) => {
                // Keep the OS lock past the guard; closing the file releases it
                std::mem::forget(guard);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Err(LockError::AlreadyHeld {
                    key: key.to_string(),
                    path: lock_path,
                });
            }
            Err(source) => {
                return Err(LockError::Io {
                    path: lock_path,
                    source,
                })
            }
        }

        info!("Acquired backup lock: {}", key);

        Ok(Self {
            _lock: lock,
            lock_path,
        })
    }

    /// Get the lock file path for a key
    fn lock_path(lock_dir: &Path, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();

        lock_dir.join(format!("backup-scheduler-{}.lock", sanitized))
    }

    /// Get the lock file path (for cleanup or inspection)
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        info!("Released backup lock: {:?}", self.lock_path);
    }
}
