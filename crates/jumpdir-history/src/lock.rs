//! Advisory cross-process lock guarding load-modify-store of the history.
//!
//! Two shells can run jumpdir at once. Each holds an exclusive `flock`-style
//! lock on a companion file for the whole cycle; the lock is released when
//! the guard drops, on every exit path.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use jumpdir_core::HistoryError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Held exclusive lock on a history lock file.
#[derive(Debug)]
pub struct HistoryLock {
    file: File,
    path: PathBuf,
}

impl HistoryLock {
    /// Acquire the lock, polling until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::LockTimeout`] if another process holds the lock
    /// for longer than `timeout`, and [`HistoryError::WriteFailed`] if the lock
    /// file cannot be created or locked.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, HistoryError> {
        let write_failed = |source| HistoryError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(write_failed)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(write_failed)?;

        let started = Instant::now();
        loop {
            match fs2::FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    debug!(lock = %path.display(), waited = ?started.elapsed(), "history lock acquired");
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if is_contended(&e) => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        return Err(HistoryError::LockTimeout {
                            path: path.to_path_buf(),
                            waited,
                        });
                    }
                    trace!(lock = %path.display(), "history lock busy, retrying");
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(write_failed(e)),
            }
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for HistoryLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            debug!(lock = %self.path.display(), error = %e, "failed to release history lock");
        }
    }
}

fn is_contended(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
