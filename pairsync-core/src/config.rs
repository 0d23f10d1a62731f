//! Configuration store for the pairsync daemon.
//!
//! # Storage layout
//!
//! ```text
//! ~/.pairsync/
//!   config.yaml     (mode 0600; template written on first run)
//!   pairsync.log    (owned by pairsync-daemon)
//!   pairsync.lock   (owned by pairsync-daemon)
//! ```
//!
//! # API pattern
//!
//! Every filesystem-touching function has two forms:
//! - `fn_at(home: &Path, ...)`: explicit home, used in tests with `TempDir`
//! - `fn(...)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{Config, SyncPair, Timings};

/// Configuration file name under the app directory.
pub const CONFIG_FILE: &str = "config.yaml";

/// Sentinel written into the template; a field still holding it (or left
/// empty) fails validation before any sync activity.
pub const PLACEHOLDER: &str = "CHANGEME";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.pairsync/`; pure, no I/O.
pub fn app_dir_at(home: &Path) -> PathBuf {
    home.join(".pairsync")
}

/// `<home>/.pairsync/config.yaml`; pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    app_dir_at(home).join(CONFIG_FILE)
}

/// Creates `<home>/.pairsync/` (mode `0700`) if it does not yet exist.
pub fn ensure_app_dir_at(home: &Path) -> Result<PathBuf, ConfigError> {
    let dir = app_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

/// `ensure_app_dir_at` convenience wrapper.
pub fn ensure_app_dir() -> Result<PathBuf, ConfigError> {
    ensure_app_dir_at(&home()?)
}

// ---------------------------------------------------------------------------
// 2. Raw file schema
// ---------------------------------------------------------------------------

/// On-disk shape: a `General` section plus one mapping per sync pair,
/// keyed `Pair1`, `Pair2`, …
#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(rename = "General")]
    general: RawGeneral,
    #[serde(flatten)]
    sections: BTreeMap<String, RawPair>,
}

#[derive(Debug, Deserialize)]
struct RawGeneral {
    initdelay: u64,
    retry: u64,
    interval: u64,
}

#[derive(Debug, Deserialize)]
struct RawPair {
    local: String,
    remote: String,
    #[serde(default)]
    rsync: Option<String>,
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load and validate `<home>/.pairsync/config.yaml`.
///
/// First run (no file): writes the template and returns
/// [`ConfigError::Missing`]; this is onboarding, not a retryable error.
/// An existing but unfilled or malformed file fails validation before any
/// network or subprocess activity.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    ensure_app_dir_at(home)?;
    let path = config_path_at(home);
    if !path.exists() {
        write_template_at(home)?;
        return Err(ConfigError::Missing { path });
    }

    let contents = std::fs::read_to_string(&path)?;
    let raw: RawFile =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?;
    validate(raw)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 4. Validation
// ---------------------------------------------------------------------------

fn validate(raw: RawFile) -> Result<Config, ConfigError> {
    let timings = Timings::from_seconds(
        raw.general.initdelay,
        raw.general.retry,
        raw.general.interval,
    );

    // Order pairs by their numeric suffix, not lexically (Pair2 < Pair10).
    let mut numbered: Vec<(u32, String, RawPair)> = Vec::with_capacity(raw.sections.len());
    for (name, section) in raw.sections {
        let index =
            pair_index(&name).ok_or_else(|| ConfigError::BadSection { name: name.clone() })?;
        numbered.push((index, name, section));
    }
    numbered.sort_by_key(|(index, _, _)| *index);

    let mut pairs = Vec::with_capacity(numbered.len());
    for (_, name, section) in numbered {
        pairs.push(build_pair(&name, section)?);
    }
    if pairs.is_empty() {
        return Err(ConfigError::NoPairs);
    }

    Ok(Config { timings, pairs })
}

fn pair_index(name: &str) -> Option<u32> {
    name.strip_prefix("Pair")?.parse().ok()
}

fn build_pair(section: &str, raw: RawPair) -> Result<SyncPair, ConfigError> {
    require_filled(section, "local", &raw.local)?;
    require_filled(section, "remote", &raw.remote)?;
    if let Some(rsync) = &raw.rsync {
        require_filled(section, "rsync", rsync)?;
    }

    let local = PathBuf::from(&raw.local);
    if !local.is_absolute() {
        return Err(ConfigError::LocalNotAbsolute {
            section: section.to_string(),
            path: local,
        });
    }

    let host = host_of(section, &raw.remote)?;
    let bootstrap = match raw.rsync {
        Some(rsync) => rsync,
        None => derive_bootstrap(section, &raw.remote)?,
    };

    Ok(SyncPair {
        local,
        remote: raw.remote,
        bootstrap,
        host,
    })
}

fn require_filled(section: &str, field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() || value == PLACEHOLDER {
        return Err(ConfigError::Unfilled {
            section: section.to_string(),
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Split `scheme://authority/path` into `(authority, path)`.
///
/// The path keeps its own leading slash when the address carries a double
/// slash (`ssh://mars//home/jim` → `("mars", "/home/jim")`), which is how
/// absolute paths survive the round trip into rsync syntax.
fn split_remote<'a>(section: &str, remote: &'a str) -> Result<(&'a str, &'a str), ConfigError> {
    let bad = || ConfigError::BadRemote {
        section: section.to_string(),
        value: remote.to_string(),
    };

    let (scheme, rest) = remote.split_once("://").ok_or_else(bad)?;
    if scheme.is_empty() {
        return Err(bad());
    }
    let (authority, path) = match rest.split_once('/') {
        Some((authority, path)) => (authority, path),
        None => (rest, ""),
    };
    if authority.is_empty() || authority.ends_with('@') {
        return Err(bad());
    }
    Ok((authority, path))
}

/// Hostname component of a reconcile address, `user@` prefix stripped.
fn host_of(section: &str, remote: &str) -> Result<String, ConfigError> {
    let (authority, _) = split_remote(section, remote)?;
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    Ok(host.to_string())
}

/// Default bootstrap address: `scheme://authority/path` → `authority:path`.
fn derive_bootstrap(section: &str, remote: &str) -> Result<String, ConfigError> {
    let (authority, path) = split_remote(section, remote)?;
    Ok(format!("{authority}:{path}"))
}

// ---------------------------------------------------------------------------
// 5. Template
// ---------------------------------------------------------------------------

const TEMPLATE: &str = "\
# pairsync configuration.
#
# Timing values are in seconds. Each PairN section maps a local directory
# onto a remote directory reachable over ssh.
#
# remote uses scheme://host/path syntax; a double slash before the path
# makes it absolute, e.g. ssh://mars//home/you
# rsync is the bootstrap-copy address; when omitted it is derived from
# remote as host:path.
General:
  initdelay: 120
  retry: 1800
  interval: 120

Pair1:
  local: CHANGEME
  remote: CHANGEME
";

/// Atomically write the first-run template (mode `0600`).
///
/// Write flow: `.tmp` sibling → chmod → `rename`, same directory so the
/// rename never crosses filesystems.
fn write_template_at(home: &Path) -> Result<(), ConfigError> {
    let dir = ensure_app_dir_at(home)?;
    let path = config_path_at(home);
    let tmp = dir.join(format!("{CONFIG_FILE}.tmp"));
    std::fs::write(&tmp, TEMPLATE)?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
pub(crate) fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
pub(crate) fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
