//! Error types for pairsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration loading and scaffolding.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load, with file path and line context.
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.pairsync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// No configuration file existed; a template has just been written.
    #[error("no configuration at {path}; a template was written there, fill it in and rerun")]
    Missing { path: PathBuf },

    /// A required field still holds the unfilled placeholder (or is empty).
    #[error("configuration field {section}.{field} is unfilled; edit the file and rerun")]
    Unfilled { section: String, field: String },

    /// The file parsed but declared no `Pair<N>` sections.
    #[error("configuration declares no sync pairs; add at least one Pair section")]
    NoPairs,

    /// A top-level section name is not `General` or `Pair<N>`.
    #[error("unrecognized configuration section '{name}'; pair sections must be named Pair1, Pair2, ...")]
    BadSection { name: String },

    /// A reconcile address did not parse as `scheme://host/path`.
    #[error("{section}.remote '{value}' is not a scheme://host/path address")]
    BadRemote { section: String, value: String },

    /// A local path was not absolute.
    #[error("{section}.local '{path}' must be an absolute path")]
    LocalNotAbsolute { section: String, path: PathBuf },
}
