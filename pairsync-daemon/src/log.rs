//! Append-only durable event log.
//!
//! Human-readable timestamped lines, flushed on every write so a crash
//! mid-cycle loses nothing already reported. The file is never rotated
//! or truncated by the daemon.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{io_err, DaemonError};

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
pub struct EventLog {
    file: File,
    path: PathBuf,
}

impl EventLog {
    /// Open (or create) the log for appending.
    pub fn open(path: &Path) -> Result<Self, DaemonError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| io_err(path, e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Append one timestamped line and flush immediately.
    pub fn line(&mut self, message: &str) -> Result<(), DaemonError> {
        let stamp = Local::now().format(STAMP_FORMAT);
        writeln!(self.file, "[{stamp}] {message}").map_err(|e| io_err(&self.path, e))?;
        self.file.flush().map_err(|e| io_err(&self.path, e))
    }

    /// Cycle delimiter, one per loop iteration.
    pub fn banner(&mut self) -> Result<(), DaemonError> {
        let stamp = Local::now().format(STAMP_FORMAT);
        writeln!(self.file, "\n============ {stamp} ============")
            .map_err(|e| io_err(&self.path, e))?;
        self.file.flush().map_err(|e| io_err(&self.path, e))
    }

    /// Clone of the underlying handle, used to redirect subprocess output
    /// straight into the log; tool output is never buffered in memory.
    pub fn handle(&self) -> Result<File, DaemonError> {
        self.file.try_clone().map_err(|e| io_err(&self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
