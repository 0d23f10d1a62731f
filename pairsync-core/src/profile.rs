//! One-shot scaffold for the reconciliation tool's preference file.
//!
//! Unison reads `~/.unison/default.prf`. The daemon guarantees the file
//! exists with a fixed non-interactive preference set before the first
//! reconcile runs; an existing profile is never touched.

use std::path::{Path, PathBuf};

use crate::config::set_file_permissions;
use crate::error::ConfigError;

/// Profile file name inside the unison directory.
pub const PROFILE_FILE: &str = "default.prf";

/// Contents written on first scaffold: ignore patterns for transient
/// files, auto-accept batch mode, a bounded worker count, and ssh
/// compression.
const DEFAULT_PROFILE: &str = "\
# Unison preferences managed by pairsync.
ignore = Name .nfs*
ignore = Name *~
ignore = Name .*~
ignore = Name *.tmp
ignore = Name lock
ignore = Name Cache
ignore = Name .cache
ignore = Name tmp
ignore = Name temp
ignore = Name *.iso
ignore = Name .snapshot
ignore = Name .unison*

auto = true
batch = true
fastcheck = true
maxthreads = 50
addprefsto = default

# ssh compression
sshargs = -C
";

/// `<home>/.unison/`; pure, no I/O.
pub fn unison_dir_at(home: &Path) -> PathBuf {
    home.join(".unison")
}

/// `<home>/.unison/default.prf`; pure, no I/O.
pub fn profile_path_at(home: &Path) -> PathBuf {
    unison_dir_at(home).join(PROFILE_FILE)
}

/// Ensure `<home>/.unison/default.prf` exists, writing the default
/// preference set if absent. Idempotent: an existing profile is returned
/// untouched, whatever its contents.
pub fn ensure_profile_at(home: &Path) -> Result<PathBuf, ConfigError> {
    let dir = unison_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    let path = profile_path_at(home);
    if path.exists() {
        return Ok(path);
    }

    let tmp = dir.join(format!("{PROFILE_FILE}.tmp"));
    std::fs::write(&tmp, DEFAULT_PROFILE)?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, &path)?;
    Ok(path)
}

/// `ensure_profile_at` convenience wrapper.
pub fn ensure_profile() -> Result<PathBuf, ConfigError> {
    ensure_profile_at(&dirs::home_dir().ok_or(ConfigError::HomeNotFound)?)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
