//! Pairsync daemon runtime: instance lock, event log, notifier, command
//! runner, per-pair reconciler, and the blocking orchestration loop.

pub mod command;
mod error;
pub mod lock;
pub mod log;
pub mod notify;
pub mod paths;
pub mod reconcile;
mod runtime;

pub use command::{CommandRunner, RunOutcome};
pub use error::DaemonError;
pub use lock::InstanceLock;
pub use log::EventLog;
pub use notify::{Notifier, Severity};
pub use reconcile::{PairOutcome, Reconciler, ToolSet};
pub use runtime::{start_blocking, LoopOptions};
