//! Status delivery: durable log lines plus ephemeral desktop alerts.

use std::fs::File;
use std::process::{Command, Stdio};

use crate::error::DaemonError;
use crate::log::EventLog;
use crate::paths::APP_TITLE;

const NOTIFY_SEND: &str = "notify-send";

/// Urgency of a notification. `Critical` marks conditions a user should
/// act on (unreachable host, failed sync, fatal startup errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Critical,
}

impl Severity {
    fn urgency(self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Critical => "critical",
        }
    }
}

/// Routes messages to the event log and, unless constructed
/// desktop-disabled, to `notify-send`.
#[derive(Debug)]
pub struct Notifier {
    log: EventLog,
    desktop: bool,
}

impl Notifier {
    pub fn new(log: EventLog, desktop: bool) -> Self {
        Self { log, desktop }
    }

    /// Append to the durable log, then raise a best-effort desktop alert.
    /// Desktop delivery failure never propagates.
    pub fn notify(&mut self, message: &str, severity: Severity) -> Result<(), DaemonError> {
        self.log.line(message)?;
        self.desktop_alert(message, severity);
        Ok(())
    }

    /// Durable log only, no desktop alert.
    pub fn log_only(&mut self, message: &str) -> Result<(), DaemonError> {
        self.log.line(message)
    }

    /// Cycle delimiter in the durable log.
    pub fn banner(&mut self) -> Result<(), DaemonError> {
        self.log.banner()
    }

    /// Raw log handle for subprocess output redirection.
    pub fn log_handle(&self) -> Result<File, DaemonError> {
        self.log.handle()
    }

    fn desktop_alert(&self, message: &str, severity: Severity) {
        if !self.desktop {
            return;
        }
        let _ = Command::new(NOTIFY_SEND)
            .args(["-u", severity.urgency(), APP_TITLE, message])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn notifier_in(dir: &std::path::Path) -> (Notifier, std::path::PathBuf) {
        let path = dir.join("pairsync.log");
        let log = EventLog::open(&path).expect("open log");
        (Notifier::new(log, false), path)
    }

    #[test]
    fn notify_appends_to_log() {
        let dir = TempDir::new().expect("tempdir");
        let (mut notifier, path) = notifier_in(dir.path());
        notifier
            .notify("Sync of /home/jim/uhome complete", Severity::Normal)
            .expect("notify");

        let contents = std::fs::read_to_string(path).expect("read log");
        assert!(contents.contains("Sync of /home/jim/uhome complete"));
    }

    #[test]
    fn log_only_skips_desktop_and_still_logs() {
        let dir = TempDir::new().expect("tempdir");
        let (mut notifier, path) = notifier_in(dir.path());
        notifier.log_only("Reconcile started").expect("log_only");

        let contents = std::fs::read_to_string(path).expect("read log");
        assert!(contents.contains("Reconcile started"));
    }

    #[test]
    fn severity_maps_to_urgency() {
        assert_eq!(Severity::Normal.urgency(), "normal");
        assert_eq!(Severity::Critical.urgency(), "critical");
    }
}
