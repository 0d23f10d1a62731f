//! Domain types for the pairsync daemon.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem
//! paths. Remote addresses stay `String`: they are opaque subprocess
//! arguments, not local paths.

use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Sync pairs
// ---------------------------------------------------------------------------

/// One configured (local directory, remote directory) relationship.
///
/// Constructed once per process start by [`crate::config::load_at`];
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPair {
    /// Absolute path of the local mirror on this host.
    pub local: PathBuf,

    /// Reconcile address in `scheme://host/path` syntax, handed to the
    /// steady-state sync tool verbatim.
    pub remote: String,

    /// Bootstrap address in rsync syntax (`host:path`), used only for the
    /// one-time initial copy. Derived from `remote` when not configured.
    pub bootstrap: String,

    /// Hostname extracted from `remote`, with any `user@` prefix stripped.
    /// Used for liveness probing only.
    pub host: String,
}

// ---------------------------------------------------------------------------
// Timing parameters
// ---------------------------------------------------------------------------

/// Loop timing parameters, loaded once at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Pause before the first cycle (skipped in single-shot mode).
    pub init_delay: Duration,

    /// Sleep after a cycle in which at least one host was unreachable.
    pub retry: Duration,

    /// Sleep after a fully reachable cycle.
    pub interval: Duration,
}

impl Timings {
    pub fn from_seconds(init_delay: u64, retry: u64, interval: u64) -> Self {
        Self {
            init_delay: Duration::from_secs(init_delay),
            retry: Duration::from_secs(retry),
            interval: Duration::from_secs(interval),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level configuration
// ---------------------------------------------------------------------------

/// Validated configuration: timing parameters plus a non-empty ordered
/// list of sync pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub timings: Timings,
    pub pairs: Vec<SyncPair>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
