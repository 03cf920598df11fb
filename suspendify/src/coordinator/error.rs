//! Coordinator error types

use std::fmt;

use thiserror::Error;

/// Which user hook was running when a transition failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Resume,
    Suspend,
    SuspendCancelled,
    Wakeup,
    PollLinger,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::Resume => write!(f, "resume"),
            HookKind::Suspend => write!(f, "suspend"),
            HookKind::SuspendCancelled => write!(f, "suspend-cancelled"),
            HookKind::Wakeup => write!(f, "wakeup"),
            HookKind::PollLinger => write!(f, "poll-linger"),
        }
    }
}

/// Errors surfaced by a transition request
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A user hook returned an error; the transition did not complete
    #[error("{hook} hook failed: {source}")]
    Hook {
        hook: HookKind,
        #[source]
        source: eyre::Report,
    },

    /// The reconciliation task panicked or was torn down with its runtime
    #[error("Transition aborted: {0}")]
    Aborted(String),
}

impl CoordinatorError {
    pub(crate) fn hook(hook: HookKind, source: eyre::Report) -> Self {
        CoordinatorError::Hook { hook, source }
    }

    /// The failing hook, if this error came from one
    pub fn hook_kind(&self) -> Option<HookKind> {
        match self {
            CoordinatorError::Hook { hook, .. } => Some(*hook),
            CoordinatorError::Aborted(_) => None,
        }
    }
}

/// Result alias for transition requests
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
