//! Blocking orchestration loop.
//!
//! Single-threaded by design: probes, subprocesses, and sleeps all block
//! the one control thread, so a slow pair simply delays the pairs after
//! it within the same cycle.

use std::path::Path;
use std::thread;
use std::time::Duration;

use pairsync_core::{config, profile, Config, Timings};

use crate::command::{CommandRunner, RunOutcome};
use crate::error::DaemonError;
use crate::lock::InstanceLock;
use crate::log::EventLog;
use crate::notify::{Notifier, Severity};
use crate::paths;
use crate::reconcile::{PairOutcome, Reconciler, ToolSet};

/// Knobs from the command line.
#[derive(Debug, Clone, Default)]
pub struct LoopOptions {
    /// Run exactly one cycle, skip the initial delay, then return.
    pub single: bool,

    /// Echo each external command line into the log before running it.
    pub verbose: bool,

    /// Raise desktop notifications (left off in tests).
    pub desktop: bool,
}

/// Run the daemon until a fatal condition, or for exactly one cycle in
/// single-shot mode. Blocks the calling thread throughout.
///
/// Ordering matters in the startup sequence: the instance lock comes
/// before everything else, so a losing instance leaves no trace, and the
/// log opens before config loading so config failures can be notified.
pub fn start_blocking(home: &Path, opts: &LoopOptions) -> Result<(), DaemonError> {
    init_tracing();

    config::ensure_app_dir_at(home)?;
    let lock = InstanceLock::acquire(&paths::lock_path(home))?;
    tracing::debug!(path = %lock.path().display(), "instance lock acquired");

    let log = EventLog::open(&paths::log_path(home))?;
    let mut notifier = Notifier::new(log, opts.desktop);

    let config = match config::load_at(home) {
        Ok(config) => config,
        Err(err) => {
            notifier.notify(&err.to_string(), Severity::Critical)?;
            return Err(err.into());
        }
    };
    profile::ensure_profile_at(home)?;
    tracing::info!(pairs = config.pairs.len(), "configuration loaded");

    let tools = ToolSet::default();
    let runner = CommandRunner::new(opts.verbose);
    run_with(&config, &tools, &runner, &mut notifier, opts)
}

/// Loop body with every collaborator injected; [`start_blocking`] wires
/// the production set, tests substitute stub tools.
pub(crate) fn run_with(
    config: &Config,
    tools: &ToolSet,
    runner: &CommandRunner,
    notifier: &mut Notifier,
    opts: &LoopOptions,
) -> Result<(), DaemonError> {
    ensure_agent_session(runner, tools, notifier)?;

    if !opts.single && !config.timings.init_delay.is_zero() {
        let secs = config.timings.init_delay.as_secs();
        notifier.notify(
            &format!("Delaying start for {secs} seconds..."),
            Severity::Normal,
        )?;
        thread::sleep(config.timings.init_delay);
    }

    let reconciler = Reconciler::new(runner, tools);
    loop {
        notifier.banner()?;
        let degraded = run_cycle(&reconciler, notifier, config)?;

        if opts.single {
            tracing::info!("single-shot cycle finished");
            return Ok(());
        }

        let pause = next_sleep(degraded, &config.timings);
        if degraded {
            notifier.notify(
                &format!(
                    "Sync host unavailable! Sleeping for {} seconds...",
                    pause.as_secs()
                ),
                Severity::Critical,
            )?;
        }
        thread::sleep(pause);
    }
}

/// One pass over all pairs, in configuration order. Returns whether any
/// pair's host was unreachable this cycle.
fn run_cycle(
    reconciler: &Reconciler<'_>,
    notifier: &mut Notifier,
    config: &Config,
) -> Result<bool, DaemonError> {
    let mut degraded = false;
    for pair in &config.pairs {
        match reconciler.sync_pair(notifier, pair)? {
            PairOutcome::Unreachable => degraded = true,
            PairOutcome::Synced => {}
            PairOutcome::ReconcileFailed => {
                tracing::warn!(
                    local = %pair.local.display(),
                    "reconcile failed; retrying next cycle",
                );
            }
        }
    }
    Ok(degraded)
}

/// Unreachable hosts widen the next pause to the retry interval.
fn next_sleep(degraded: bool, timings: &Timings) -> Duration {
    if degraded {
        timings.retry
    } else {
        timings.interval
    }
}

/// `ssh-add -l` exits 0 or 1 when an agent session is reachable, 2 when
/// none is available.
fn ensure_agent_session(
    runner: &CommandRunner,
    tools: &ToolSet,
    notifier: &mut Notifier,
) -> Result<(), DaemonError> {
    let outcome = runner.run(notifier, &tools.ssh_add, &["-l"])?;
    let present = match &outcome {
        RunOutcome::Exited(status) => matches!(status.code(), Some(0) | Some(1)),
        RunOutcome::Failed(_) => false,
    };
    if !present {
        notifier.notify(
            "No ssh agent session; cannot sync unattended",
            Severity::Critical,
        )?;
        return Err(DaemonError::AgentMissing);
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
