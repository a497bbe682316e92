// src/store/lock.rs

//! Advisory file locks for shared documents.

use std::ffi::OsString;
use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::errors::{AgentloopError, Result};

/// How long to sleep between lock attempts while another holder is active.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Path of the lock file guarding `document` (`tasks.json` -> `tasks.json.lock`).
pub fn lock_path_for(document: &Path) -> PathBuf {
    let mut name: OsString = document
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    document.with_file_name(name)
}

/// Exclusive advisory lock held for as long as the guard is alive.
///
/// The lock lives on a dedicated lock file; the document itself is replaced
/// by rename on every write, so it cannot carry the lock.
///
/// Each `acquire` opens its own file handle, so two threads of the same
/// process exclude each other just like two processes do.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the lock at `lock_path` is held, or fail with
    /// [`AgentloopError::LockTimeout`] once `timeout` has elapsed.
    pub fn acquire(lock_path: &Path, timeout: Duration) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(lock_path)?;

        let started = Instant::now();
        loop {
            match file.try_lock() {
                Ok(()) => {
                    trace!(
                        lock = %lock_path.display(),
                        waited_ms = started.elapsed().as_millis() as u64,
                        "acquired document lock"
                    );
                    return Ok(Self {
                        file,
                        path: lock_path.to_path_buf(),
                    });
                }
                Err(TryLockError::WouldBlock) => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        warn!(
                            lock = %lock_path.display(),
                            waited_ms = waited.as_millis() as u64,
                            "gave up waiting for document lock"
                        );
                        return Err(AgentloopError::LockTimeout {
                            path: lock_path.to_path_buf(),
                            waited,
                        });
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(TryLockError::Error(err)) => return Err(err.into()),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            warn!(lock = %self.path.display(), error = %err, "failed to release document lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_path_appends_suffix() {
        let p = lock_path_for(Path::new("/tmp/project/tasks.json"));
        assert_eq!(p, PathBuf::from("/tmp/project/tasks.json.lock"));
    }

    #[test]
    fn second_acquire_times_out_while_first_is_held() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("doc.json.lock");

        let held = FileLock::acquire(&lock_path, Duration::from_secs(1)).unwrap();
        let err = FileLock::acquire(&lock_path, Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, AgentloopError::LockTimeout { .. }));

        drop(held);
        assert!(FileLock::acquire(&lock_path, Duration::from_millis(50)).is_ok());
    }
}
