use std::path::{Path, PathBuf};

use pairsync_core::config::app_dir_at;

pub const LOG_FILE: &str = "pairsync.log";
pub const LOCK_FILE: &str = "pairsync.lock";

/// Title used for desktop notifications.
pub const APP_TITLE: &str = "Pairsync";

pub fn log_path(home: &Path) -> PathBuf {
    app_dir_at(home).join(LOG_FILE)
}

pub fn lock_path(home: &Path) -> PathBuf {
    app_dir_at(home).join(LOCK_FILE)
}
