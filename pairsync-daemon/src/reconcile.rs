//! Per-pair reconciliation: liveness probe, one-time bootstrap copy,
//! steady-state bidirectional sync.

use pairsync_core::SyncPair;

use crate::command::CommandRunner;
use crate::error::DaemonError;
use crate::notify::{Notifier, Severity};

/// Probes sent per liveness check.
const PING_COUNT: &str = "5";

/// Program names of the external collaborators. Defaults resolve through
/// `PATH`; tests substitute stub scripts.
#[derive(Debug, Clone)]
pub struct ToolSet {
    pub ping: String,
    pub rsync: String,
    pub unison: String,
    pub ssh_add: String,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self {
            ping: "ping".to_string(),
            rsync: "rsync".to_string(),
            unison: "unison".to_string(),
            ssh_add: "ssh-add".to_string(),
        }
    }
}

/// What one pair's cycle step concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// Host probe failed; copy and reconcile were skipped for this pair.
    Unreachable,
    /// Reconciliation completed cleanly (and the bootstrap too, if one ran).
    Synced,
    /// Reconciliation exited nonzero; retried next cycle.
    ReconcileFailed,
}

/// Drives one [`SyncPair`] through its two-phase lifecycle each cycle.
#[derive(Debug)]
pub struct Reconciler<'a> {
    runner: &'a CommandRunner,
    tools: &'a ToolSet,
}

impl<'a> Reconciler<'a> {
    pub fn new(runner: &'a CommandRunner, tools: &'a ToolSet) -> Self {
        Self { runner, tools }
    }

    /// Probe, bootstrap if the local mirror does not exist yet, reconcile.
    ///
    /// A failed bootstrap aborts the whole process, not just the pair:
    /// reconciling against a partially copied tree risks data loss.
    pub fn sync_pair(
        &self,
        notifier: &mut Notifier,
        pair: &SyncPair,
    ) -> Result<PairOutcome, DaemonError> {
        if !self.host_reachable(notifier, &pair.host)? {
            notifier.notify(
                &format!("Sync host {} unavailable!", pair.host),
                Severity::Critical,
            )?;
            return Ok(PairOutcome::Unreachable);
        }

        if !pair.local.exists() {
            self.bootstrap(notifier, pair)?;
        }

        self.reconcile(notifier, pair)
    }

    fn host_reachable(&self, notifier: &mut Notifier, host: &str) -> Result<bool, DaemonError> {
        let outcome =
            self.runner
                .run(notifier, &self.tools.ping, &["-q", "-c", PING_COUNT, host])?;
        Ok(outcome.success())
    }

    fn bootstrap(&self, notifier: &mut Notifier, pair: &SyncPair) -> Result<(), DaemonError> {
        let local = pair.local.display().to_string();
        notifier.notify(
            &format!("Starting initial sync of {local}..."),
            Severity::Normal,
        )?;

        let source = bootstrap_source(&pair.bootstrap);
        let outcome = self
            .runner
            .run(notifier, &self.tools.rsync, &["-raz", &source, &local])?;
        if !outcome.success() {
            notifier.notify("Could not sync! Aborting...", Severity::Critical)?;
            return Err(DaemonError::BootstrapFailed {
                local: pair.local.clone(),
                reason: outcome.to_string(),
            });
        }

        notifier.notify(&format!("Initial sync of {local} complete"), Severity::Normal)?;
        Ok(())
    }

    fn reconcile(
        &self,
        notifier: &mut Notifier,
        pair: &SyncPair,
    ) -> Result<PairOutcome, DaemonError> {
        let local = pair.local.display().to_string();
        notifier.log_only(&format!("Reconcile of {local} started"))?;

        let outcome = self.runner.run(
            notifier,
            &self.tools.unison,
            &[
                &local,
                &pair.remote,
                "-ui",
                "text",
                "-batch",
                "-prefer",
                "newer",
                "-times=true",
            ],
        )?;

        if outcome.success() {
            notifier.notify(&format!("Sync of {local} complete"), Severity::Normal)?;
            Ok(PairOutcome::Synced)
        } else {
            notifier.notify(
                &format!("Sync of {local} failed ({outcome})"),
                Severity::Critical,
            )?;
            Ok(PairOutcome::ReconcileFailed)
        }
    }
}

/// Bootstrap copy source with the trailing separator enforced.
///
/// Without it the copy would materialize the remote directory itself as a
/// subdirectory of `local` instead of mirroring its contents. A bare
/// `host:` address (remote home) becomes `host:./` for the same reason.
fn bootstrap_source(bootstrap: &str) -> String {
    if bootstrap.ends_with('/') {
        bootstrap.to_string()
    } else if bootstrap.ends_with(':') {
        format!("{bootstrap}./")
    } else {
        format!("{bootstrap}/")
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::log::EventLog;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Write an executable stub that records its invocation and exits
    /// with a fixed status.
    fn stub(dir: &Path, name: &str, calls: &Path, exit: i32) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        let body = format!(
            "#!/bin/sh\necho \"{name} $*\" >> \"{calls}\"\nexit {exit}\n",
            calls = calls.display(),
        );
        std::fs::write(&path, body).expect("write stub");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        path.display().to_string()
    }

    struct Harness {
        dir: TempDir,
        tools: ToolSet,
        calls: PathBuf,
        notifier: Notifier,
    }

    fn harness(ping_exit: i32, rsync_exit: i32, unison_exit: i32) -> Harness {
        let dir = TempDir::new().expect("tempdir");
        let calls = dir.path().join("calls.txt");
        let tools = ToolSet {
            ping: stub(dir.path(), "ping", &calls, ping_exit),
            rsync: stub(dir.path(), "rsync", &calls, rsync_exit),
            unison: stub(dir.path(), "unison", &calls, unison_exit),
            ssh_add: stub(dir.path(), "ssh-add", &calls, 0),
        };
        let log = EventLog::open(&dir.path().join("pairsync.log")).expect("log");
        let notifier = Notifier::new(log, false);
        Harness {
            dir,
            tools,
            calls,
            notifier,
        }
    }

    fn pair_at(local: &Path) -> SyncPair {
        SyncPair {
            local: local.to_path_buf(),
            remote: "ssh://mars//home/jim".to_string(),
            bootstrap: "mars:/home/jim".to_string(),
            host: "mars".to_string(),
        }
    }

    fn invoked_programs(calls: &Path) -> Vec<String> {
        std::fs::read_to_string(calls)
            .unwrap_or_default()
            .lines()
            .filter_map(|line| line.split(' ').next().map(str::to_string))
            .collect()
    }

    #[test]
    fn existing_local_skips_bootstrap() {
        let mut h = harness(0, 0, 0);
        let local = h.dir.path().join("mirror");
        std::fs::create_dir_all(&local).expect("mkdir");
        let runner = CommandRunner::new(false);
        let reconciler = Reconciler::new(&runner, &h.tools);

        let outcome = reconciler
            .sync_pair(&mut h.notifier, &pair_at(&local))
            .expect("sync");
        assert_eq!(outcome, PairOutcome::Synced);
        assert_eq!(invoked_programs(&h.calls), vec!["ping", "unison"]);
    }

    #[test]
    fn missing_local_bootstraps_before_reconcile() {
        let mut h = harness(0, 0, 0);
        let local = h.dir.path().join("mirror");
        let runner = CommandRunner::new(false);
        let reconciler = Reconciler::new(&runner, &h.tools);

        let outcome = reconciler
            .sync_pair(&mut h.notifier, &pair_at(&local))
            .expect("sync");
        assert_eq!(outcome, PairOutcome::Synced);
        assert_eq!(invoked_programs(&h.calls), vec!["ping", "rsync", "unison"]);

        let recorded = std::fs::read_to_string(&h.calls).expect("calls");
        assert!(
            recorded.contains("rsync -raz mars:/home/jim/ "),
            "bootstrap source must keep the trailing slash: {recorded}"
        );
    }

    #[test]
    fn unreachable_host_skips_copy_and_reconcile() {
        let mut h = harness(1, 0, 0);
        let local = h.dir.path().join("mirror");
        std::fs::create_dir_all(&local).expect("mkdir");
        let runner = CommandRunner::new(false);
        let reconciler = Reconciler::new(&runner, &h.tools);

        let outcome = reconciler
            .sync_pair(&mut h.notifier, &pair_at(&local))
            .expect("sync");
        assert_eq!(outcome, PairOutcome::Unreachable);
        assert_eq!(invoked_programs(&h.calls), vec!["ping"]);
    }

    #[test]
    fn bootstrap_failure_is_fatal_and_blocks_reconcile() {
        let mut h = harness(0, 1, 0);
        let local = h.dir.path().join("mirror");
        let runner = CommandRunner::new(false);
        let reconciler = Reconciler::new(&runner, &h.tools);

        let err = reconciler
            .sync_pair(&mut h.notifier, &pair_at(&local))
            .unwrap_err();
        assert!(matches!(err, DaemonError::BootstrapFailed { .. }));
        assert_eq!(invoked_programs(&h.calls), vec!["ping", "rsync"]);
    }

    #[test]
    fn reconcile_failure_is_tolerated() {
        let mut h = harness(0, 0, 2);
        let local = h.dir.path().join("mirror");
        std::fs::create_dir_all(&local).expect("mkdir");
        let runner = CommandRunner::new(false);
        let reconciler = Reconciler::new(&runner, &h.tools);

        let outcome = reconciler
            .sync_pair(&mut h.notifier, &pair_at(&local))
            .expect("sync");
        assert_eq!(outcome, PairOutcome::ReconcileFailed);
    }

    #[test]
    fn reconcile_passes_batch_flags() {
        let mut h = harness(0, 0, 0);
        let local = h.dir.path().join("mirror");
        std::fs::create_dir_all(&local).expect("mkdir");
        let runner = CommandRunner::new(false);
        let reconciler = Reconciler::new(&runner, &h.tools);
        reconciler
            .sync_pair(&mut h.notifier, &pair_at(&local))
            .expect("sync");

        let recorded = std::fs::read_to_string(&h.calls).expect("calls");
        assert!(recorded.contains("-ui text -batch -prefer newer -times=true"));
        assert!(recorded.contains("ssh://mars//home/jim"));
    }

    #[test]
    fn bootstrap_source_enforces_separator() {
        assert_eq!(bootstrap_source("mars:/home/jim"), "mars:/home/jim/");
        assert_eq!(bootstrap_source("mars:/home/jim/"), "mars:/home/jim/");
        assert_eq!(bootstrap_source("jim@mars:work"), "jim@mars:work/");
        assert_eq!(bootstrap_source("mars:"), "mars:./");
    }
}
