//! Single-instance enforcement via an exclusive advisory file lock.
//!
//! The lock is tied to the open file handle: the OS drops it on every
//! exit path (normal return, fatal error, signal), so a crashed daemon
//! never blocks the next start.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{io_err, DaemonError};

/// Held for the whole process lifetime; releasing is dropping.
#[derive(Debug)]
pub struct InstanceLock {
    _file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Claim host-local exclusivity.
    ///
    /// On [`DaemonError::AlreadyRunning`] the caller must exit with
    /// status 1 without performing any other side effects: no log
    /// writes, no config creation.
    pub fn acquire(path: &Path) -> Result<Self, DaemonError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)
            .map_err(|e| io_err(path, e))?;

        file.try_lock_exclusive()
            .map_err(|_| DaemonError::AlreadyRunning {
                path: path.to_path_buf(),
            })?;

        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_is_denied_while_first_is_held() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("pairsync.lock");

        let first = InstanceLock::acquire(&path).expect("first acquire");
        let second = InstanceLock::acquire(&path);
        assert!(matches!(
            second,
            Err(DaemonError::AlreadyRunning { .. })
        ));
        drop(first);
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("pairsync.lock");

        let first = InstanceLock::acquire(&path).expect("first acquire");
        drop(first);
        let again = InstanceLock::acquire(&path).expect("reacquire after drop");
        assert_eq!(again.path(), path);
    }
}
