//! pairsync: keep local directories mirrored against remote hosts.
//!
//! # Usage
//!
//! ```text
//! pairsync                 run as a daemon (initial delay, then cycles)
//! pairsync --single        run exactly one cycle, then exit
//! pairsync --verbose       log every executed command line
//! pairsync --version       print version and exit
//! ```
//!
//! Designed to be launched from a shell startup hook: a second invocation
//! on the same host exits with status 1 without touching the log.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use pairsync_daemon::{start_blocking, DaemonError, LoopOptions};

#[derive(Parser, Debug)]
#[command(
    name = "pairsync",
    version,
    about = "Keep local directories mirrored against remote hosts over ssh",
    long_about = None,
)]
struct Cli {
    /// Log every executed command line before running it.
    #[arg(short, long)]
    verbose: bool,

    /// Run exactly one sync cycle, skipping the initial delay.
    #[arg(short, long)]
    single: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !is_already_running(&err) {
                eprintln!("pairsync: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let opts = LoopOptions {
        single: cli.single,
        verbose: cli.verbose,
        desktop: true,
    };
    start_blocking(&home, &opts)?;
    Ok(())
}

/// The losing side of the instance race must produce no output at all.
fn is_already_running(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<DaemonError>(),
        Some(DaemonError::AlreadyRunning { .. })
    )
}
