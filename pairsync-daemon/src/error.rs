use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the daemon runtime.
///
/// Fatal variants terminate the process with exit status 1 after a
/// critical notification; [`DaemonError::AlreadyRunning`] is the one
/// silent fatal path: the log must not be touched by a losing instance.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] pairsync_core::ConfigError),

    #[error("another pairsync instance holds {path}")]
    AlreadyRunning { path: PathBuf },

    #[error("no ssh agent session is available")]
    AgentMissing,

    #[error("bootstrap copy into {local} failed: {reason}")]
    BootstrapFailed { local: PathBuf, reason: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
