//! External tool execution.
//!
//! Commands run as argv arrays, never through a shell, with stdout and
//! stderr redirected into the event log, so arbitrarily long-running
//! tools stream output without buffering it in memory. The command lines
//! are assembled from trusted, process-local configuration only.

use std::fmt;
use std::process::{Command, ExitStatus, Stdio};

use crate::error::DaemonError;
use crate::notify::Notifier;

/// What happened to an external command: the tool's raw exit status, or
/// evidence that it could never be started.
#[derive(Debug)]
pub enum RunOutcome {
    Exited(ExitStatus),
    Failed(std::io::Error),
}

impl RunOutcome {
    /// True only for a clean zero exit.
    pub fn success(&self) -> bool {
        matches!(self, RunOutcome::Exited(status) if status.success())
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Exited(status) => status.fmt(f),
            RunOutcome::Failed(err) => write!(f, "failed to start: {err}"),
        }
    }
}

/// Executes external tools with their output routed to the durable log.
#[derive(Debug, Clone, Copy)]
pub struct CommandRunner {
    verbose: bool,
}

impl CommandRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Run `program` with `args`, returning its exit status.
    ///
    /// A child that cannot be started is reported as
    /// [`RunOutcome::Failed`] (and logged), not as an `Err`: only log I/O
    /// failures propagate.
    pub fn run(
        &self,
        notifier: &mut Notifier,
        program: &str,
        args: &[&str],
    ) -> Result<RunOutcome, DaemonError> {
        if self.verbose {
            notifier.log_only(&format!("Executing: {} {}", program, args.join(" ")))?;
        }

        let stdout = notifier.log_handle()?;
        let stderr = notifier.log_handle()?;
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status();

        match status {
            Ok(status) => Ok(RunOutcome::Exited(status)),
            Err(err) => {
                notifier.log_only(&format!("Could not start {program}: {err}"))?;
                Ok(RunOutcome::Failed(err))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
