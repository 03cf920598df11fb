//! Mode model: desired and achieved modes plus per-phase bookkeeping

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mode the coordinator can actually be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Resumed,
    Suspended,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Resumed => write!(f, "RESUMED"),
            Mode::Suspended => write!(f, "SUSPENDED"),
        }
    }
}

/// The mode the coordinator is being driven toward
///
/// `WakingUp` is transient: it fires the wakeup hook once and then turns
/// into a suspend request with the configured wakeup linger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    Resumed,
    WakingUp,
    Suspended,
}

impl Target {
    /// Whether this target is already satisfied by the given actual mode
    pub fn is_reached(self, actual: Mode) -> bool {
        matches!(
            (self, actual),
            (Target::Resumed, Mode::Resumed) | (Target::Suspended, Mode::Suspended)
        )
    }
}

impl From<Mode> for Target {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Resumed => Target::Resumed,
            Mode::Suspended => Target::Suspended,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Resumed => write!(f, "RESUMED"),
            Target::WakingUp => write!(f, "WAKING_UP"),
            Target::Suspended => write!(f, "SUSPENDED"),
        }
    }
}

/// One transition the engine is committed to run
///
/// A suspend carries the generation and linger current when it was
/// committed, so a resume that lands before the engine gets going still
/// cancels that grace window instead of erasing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Suspend { resumes: u64, linger: Duration },
    Resume,
    Wakeup,
}

/// Shared mutable state of one coordinator
///
/// Requesters write `target`, `linger` and `resumes`; everything else is
/// written only by the reconciliation loop.
#[derive(Debug, Clone)]
pub(crate) struct ModeState {
    pub target: Target,
    pub actual: Mode,
    pub linger: Duration,
    /// Generation counter, bumped by every resume and wakeup
    pub resumes: u64,
    pub updating: bool,
    pub resuming: bool,
    pub suspending: bool,
    pub waking: bool,
    /// A wakeup hook ran since the last completed suspend or resume, so a
    /// Suspended target is not yet satisfied by a Suspended actual mode
    pub awake: bool,
    /// Total calls made to the linger oracle
    pub polls: u64,
    pub suspended_at: DateTime<Utc>,
    pub resumed_at: DateTime<Utc>,
    pub woken_at: DateTime<Utc>,
}

impl ModeState {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            target: Target::Resumed,
            actual: Mode::Resumed,
            linger: Duration::ZERO,
            resumes: 0,
            updating: false,
            resuming: false,
            suspending: false,
            waking: false,
            awake: false,
            polls: 0,
            suspended_at: now,
            resumed_at: now,
            woken_at: now,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.target.is_reached(self.actual) && !(self.awake && self.target == Target::Suspended)
    }

    /// The transition that moves actual toward target, if any is needed
    pub fn next_step(&self) -> Option<Step> {
        if self.is_settled() {
            return None;
        }
        Some(match self.target {
            Target::Suspended => Step::Suspend {
                resumes: self.resumes,
                linger: self.linger,
            },
            Target::Resumed => Step::Resume,
            Target::WakingUp => Step::Wakeup,
        })
    }

    /// Commit to the next step and mark the engine as updating
    pub fn begin(&mut self) -> Option<Step> {
        let step = self.next_step();
        if step.is_some() {
            self.updating = true;
        }
        step
    }

    /// Record a suspend request; suspend never bumps the generation
    pub fn request_suspend(&mut self, linger: Duration) {
        self.target = Target::Suspended;
        self.linger = linger;
    }

    pub fn request_resume(&mut self) {
        self.target = Target::Resumed;
        self.resumes += 1;
        self.linger = Duration::ZERO;
    }

    /// Record a wakeup request; returns false when there is nothing to wake
    pub fn request_wakeup(&mut self) -> bool {
        if self.target != Target::Suspended {
            return false;
        }
        self.target = Target::WakingUp;
        self.resumes += 1;
        self.linger = Duration::ZERO;
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            target: self.target,
            actual: self.actual,
            resumes: self.resumes,
            linger_ms: u64::try_from(self.linger.as_millis()).unwrap_or(u64::MAX),
            updating: self.updating,
            resuming: self.resuming,
            suspending: self.suspending,
            waking: self.waking,
            awake: self.awake,
            polls: self.polls,
            suspended_at: self.suspended_at,
            resumed_at: self.resumed_at,
            woken_at: self.woken_at,
        }
    }
}

/// Point-in-time view of a coordinator, for introspection and tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub target: Target,
    pub actual: Mode,
    pub resumes: u64,
    #[serde(rename = "linger-ms")]
    pub linger_ms: u64,
    pub updating: bool,
    pub resuming: bool,
    pub suspending: bool,
    pub waking: bool,
    pub awake: bool,
    pub polls: u64,
    #[serde(rename = "suspended-at")]
    pub suspended_at: DateTime<Utc>,
    #[serde(rename = "resumed-at")]
    pub resumed_at: DateTime<Utc>,
    #[serde(rename = "woken-at")]
    pub woken_at: DateTime<Utc>,
}
