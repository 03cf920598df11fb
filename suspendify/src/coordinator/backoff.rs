//! Pre-suspend grace procedure with adaptive oracle polling
//!
//! Without an oracle the grace window is one fixed linger sleep. With one,
//! the window is walked in steps: sleep, ask the oracle how much grace is
//! still needed, and size the next step by exponential backoff clamped to
//! the oracle's answer, the rest of the linger window and a ceiling.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::config::CoordinatorConfig;
use super::error::{CoordinatorError, CoordinatorResult, HookKind};
use super::hooks::Hooks;
use super::linger::{LingerTimer, SleepOutcome};
use super::mode::{ModeState, Target};

/// How a grace window ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraceOutcome {
    /// Nothing intervened; the suspend may proceed
    Completed,
    /// A resume or wakeup arrived during the window
    Cancelled,
}

/// Shortest step the poll loop will ever take
const MIN_STEP: Duration = Duration::from_millis(1);

/// Step calculator for oracle polling
#[derive(Debug, Clone)]
pub struct PollBackoff {
    ceiling: Duration,
    floor: Duration,
    answered: bool,
}

impl PollBackoff {
    pub fn new(ceiling: Duration, floor: Duration) -> Self {
        Self {
            ceiling: ceiling.max(MIN_STEP),
            floor: floor.max(MIN_STEP),
            answered: false,
        }
    }

    /// Step taken before the oracle has been asked anything
    pub fn initial(&self, linger: Duration) -> Duration {
        self.ceiling.min(linger).max(MIN_STEP)
    }

    /// Next step after an oracle answer of `remaining`, with `left` of the
    /// linger window still to go. Doubling applies to the previous step as
    /// it was actually slept, after clamping.
    pub fn next(&mut self, previous: Duration, remaining: Duration, left: Duration) -> Duration {
        let base = if self.answered {
            previous
        } else {
            self.answered = true;
            self.floor
        };
        base.saturating_mul(2)
            .min(remaining)
            .min(left)
            .min(self.ceiling)
            .max(MIN_STEP)
    }
}

/// One run of the grace procedure over a coordinator's state
pub(crate) struct GraceWindow<'a> {
    pub state: &'a Mutex<ModeState>,
    pub timer: &'a LingerTimer,
    pub hooks: &'a dyn Hooks,
    pub config: &'a CoordinatorConfig,
}

impl GraceWindow<'_> {
    fn read<T>(&self, f: impl FnOnce(&ModeState) -> T) -> T {
        f(&self.state.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn verdict(&self, resumes: u64) -> GraceOutcome {
        // Both checks: the target may have cycled back to Suspended, the
        // generation never cycles back.
        let intact = self.read(|s| s.resumes == resumes && s.target == Target::Suspended);
        if intact {
            GraceOutcome::Completed
        } else {
            GraceOutcome::Cancelled
        }
    }

    async fn nap(&self, duration: Duration, resumes: u64) -> SleepOutcome {
        let outcome = self
            .timer
            .sleep_while(duration, || self.read(|s| s.resumes) == resumes)
            .await;
        if outcome == SleepOutcome::Interrupted {
            debug!(resumes, "GraceWindow::nap: interrupted");
        }
        outcome
    }

    /// Walk the grace window for a suspend committed at generation `resumes`
    /// with the given linger
    pub async fn run(&self, resumes: u64, linger: Duration) -> CoordinatorResult<GraceOutcome> {
        debug!(resumes, ?linger, pollable = self.hooks.pollable(), "GraceWindow::run: called");

        if linger.is_zero() {
            return Ok(GraceOutcome::Completed);
        }

        if !self.hooks.pollable() {
            self.nap(linger, resumes).await;
            return Ok(self.verdict(resumes));
        }

        let started = Instant::now();
        let mut backoff = PollBackoff::new(self.config.poll_ceiling(), self.config.backoff_floor());
        let mut step = backoff.initial(linger);
        let mut elapsed = Duration::ZERO;

        // The linger is re-read every round so a resuspend can stretch the window
        while elapsed < self.read(|s| s.linger) {
            if self.nap(step, resumes).await == SleepOutcome::Interrupted || self.read(|s| s.resumes) != resumes {
                break;
            }

            self.state.lock().unwrap_or_else(|e| e.into_inner()).polls += 1;
            let remaining = self
                .hooks
                .poll_linger()
                .await
                .map_err(|e| CoordinatorError::hook(HookKind::PollLinger, e))?
                .unwrap_or(Duration::ZERO);

            let (current, target, linger) = self.read(|s| (s.resumes, s.target, s.linger));
            if current != resumes || target != Target::Suspended || remaining.is_zero() {
                debug!(?remaining, %target, "GraceWindow::run: stopping early");
                break;
            }

            elapsed = started.elapsed();
            step = backoff.next(step, remaining, linger.saturating_sub(elapsed));
            debug!(?elapsed, ?step, ?remaining, "GraceWindow::run: next step");
        }

        Ok(self.verdict(resumes))
    }
}
