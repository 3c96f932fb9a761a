//! Cross-process rebuild lock
//!
//! An exclusive advisory lock on a file in the cache directory. Acquisition
//! polls a non-blocking attempt until a deadline so that no caller ever waits
//! longer than the configured timeout. The lock is released when the guard is
//! dropped.

use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Held advisory lock on the rebuild lock file
#[derive(Debug)]
pub struct RebuildLock {
    file: File,
    path: PathBuf,
}

fn is_contended(error: &std::io::Error) -> bool {
    error.kind() == ErrorKind::WouldBlock
        || error.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl RebuildLock {
    /// Try to take the lock, polling every `poll_interval` until `deadline`
    ///
    /// # Errors
    /// * `Error::LockTimeout` if another holder keeps the lock past the deadline
    /// * `Error::Io` if the lock file cannot be opened or locked
    pub async fn acquire(path: &Path, deadline: Instant, poll_interval: Duration) -> Result<Self> {
        let started = Instant::now();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| Error::io(format!("Failed to open lock file '{}'", path.display()), e))?;

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(
                        "Acquired rebuild lock {} after {} attempt(s)",
                        path.display(),
                        attempts
                    );
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if is_contended(&e) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::lock_timeout(
                            path.display().to_string(),
                            now.duration_since(started),
                        ));
                    }
                    tokio::time::sleep(poll_interval.min(deadline - now)).await;
                }
                Err(e) => {
                    return Err(Error::io(
                        format!("Failed to lock '{}'", path.display()),
                        e,
                    ));
                }
            }
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RebuildLock {
    fn drop(&mut self) {
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!("Released rebuild lock {}", self.path.display()),
            Err(e) => warn!(
                "Failed to release rebuild lock {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
