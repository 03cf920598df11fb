//! Suspendify - resume/suspend transition coordinator
//!
//! Suspendify coordinates a process (or a subsystem of one) moving between a
//! RESUMED and a SUSPENDED mode on behalf of callers that request mode
//! changes concurrently, e.g. in reaction to OS power events or backgrounding.
//!
//! # Core Concepts
//!
//! - **Single Flight**: only one transition runs at a time; later requests coalesce
//! - **Linger**: a suspend can wait out a grace period and be cancelled by a resume
//! - **Adaptive Grace**: an optional oracle stretches or shortens the grace period
//! - **Wakeup**: a one-shot hook while suspended, followed by an automatic re-suspend
//!
//! # Modules
//!
//! - [`coordinator`] - Transition engine, hooks and request handles
//! - [`config`] - Configuration types and loading
//! - [`script`] - Command scripts for the driver binary
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use suspendify::{Coordinator, HookSet};
//!
//! let coord = Coordinator::with_hooks(
//!     HookSet::new()
//!         .on_suspend(|| async { close_sockets().await })
//!         .on_resume(|| async { reconnect().await }),
//! );
//!
//! let pending = coord.suspend(Duration::from_secs(5));
//! // A resume inside the linger window cancels the suspend; the
//! // suspend_cancelled hook runs instead of the suspend hook
//! coord.resume().await?;
//! pending.await?;
//! ```

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod script;

// Re-export commonly used types
pub use config::{Config, DriverConfig};
pub use coordinator::{
    Completion, Coordinator, CoordinatorConfig, CoordinatorError, CoordinatorResult, HookKind, HookSet, Hooks, Mode,
    NoopHooks, Snapshot, Target,
};
