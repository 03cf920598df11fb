//! Coordinator for resume/suspend transitions
//!
//! The Coordinator serializes concurrent mode-change requests into one
//! in-flight transition at a time:
//! - **Mode model:** target vs. actual mode, generation counter, phase flags
//! - **Transition engine:** single-flight loop that drives actual toward target
//! - **Linger timer:** cancellable grace period before a suspend takes effect
//! - **Poll backoff:** oracle-driven stretching or shortening of that grace period
//! - **Resume signal:** lets any number of tasks wait for RESUMED

mod backoff;
mod config;
mod core;
mod error;
mod handle;
mod hooks;
mod linger;
mod mode;
mod signal;

pub use backoff::{GraceOutcome, PollBackoff};
pub use config::CoordinatorConfig;
pub use core::Coordinator;
pub use error::{CoordinatorError, CoordinatorResult, HookKind};
pub use handle::Completion;
pub use hooks::{HookSet, Hooks, NoopHooks};
pub use mode::{Mode, Snapshot, Target};
