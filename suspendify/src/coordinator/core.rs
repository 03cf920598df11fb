//! Coordinator - request API and the transition engine

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::backoff::{GraceOutcome, GraceWindow};
use super::config::CoordinatorConfig;
use super::error::{CoordinatorError, CoordinatorResult, HookKind};
use super::handle::Completion;
use super::hooks::{Hooks, NoopHooks};
use super::linger::LingerTimer;
use super::mode::{Mode, ModeState, Snapshot, Step, Target};
use super::signal::ResumeSignal;

#[derive(Debug, Clone, Copy)]
enum Phase {
    Updating,
    Resuming,
    Suspending,
    Waking,
}

/// Raises a progress flag for as long as it lives
struct PhaseFlag<'a> {
    state: &'a Mutex<ModeState>,
    phase: Phase,
}

impl<'a> PhaseFlag<'a> {
    fn raise(state: &'a Mutex<ModeState>, phase: Phase) -> Self {
        Self::set(state, phase, true);
        Self { state, phase }
    }

    fn set(state: &Mutex<ModeState>, phase: Phase, value: bool) {
        let mut s = state.lock().unwrap_or_else(|e| e.into_inner());
        match phase {
            Phase::Updating => s.updating = value,
            Phase::Resuming => s.resuming = value,
            Phase::Suspending => s.suspending = value,
            Phase::Waking => s.waking = value,
        }
    }
}

impl Drop for PhaseFlag<'_> {
    fn drop(&mut self) {
        Self::set(self.state, self.phase, false);
    }
}

struct Inner {
    config: CoordinatorConfig,
    hooks: Box<dyn Hooks>,
    state: Mutex<ModeState>,
    /// Single-flight guard: at most one reconciliation loop at a time
    flight: Arc<AsyncMutex<()>>,
    timer: LingerTimer,
    resumed: ResumeSignal,
}

/// Drives a process between RESUMED and SUSPENDED on behalf of concurrent callers
///
/// Cheap to clone; all clones share one state. Request methods record the
/// new target synchronously and then reconcile on a spawned task, so they
/// must be called from within a tokio runtime.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// Create a coordinator with the given configuration and hooks
    ///
    /// Invalid backoff settings are replaced with their defaults.
    pub fn new(config: CoordinatorConfig, hooks: impl Hooks + 'static) -> Self {
        debug!(?config, "Coordinator::new: called");
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!(error = %e, "Invalid coordinator config, using default backoff");
                CoordinatorConfig {
                    wakeup_linger_ms: config.wakeup_linger_ms,
                    ..CoordinatorConfig::default()
                }
            }
        };
        Self {
            inner: Arc::new(Inner {
                config,
                hooks: Box::new(hooks),
                state: Mutex::new(ModeState::new()),
                flight: Arc::new(AsyncMutex::new(())),
                timer: LingerTimer::new(),
                resumed: ResumeSignal::new(Mode::Resumed),
            }),
        }
    }

    /// Create a coordinator with default configuration
    pub fn with_hooks(hooks: impl Hooks + 'static) -> Self {
        Self::new(CoordinatorConfig::default(), hooks)
    }

    fn state(&self) -> MutexGuard<'_, ModeState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Request suspension after `linger` (zero suspends right away)
    pub fn suspend(&self, linger: Duration) -> Completion {
        debug!(?linger, "Coordinator::suspend: called");
        self.state().request_suspend(linger);
        self.kick()
    }

    /// Replace the linger of a pending suspend
    ///
    /// An oracle-driven grace window picks the new value up on its next
    /// round, which is how a window gets extended or shortened.
    pub fn resuspend(&self, linger: Duration) -> Completion {
        debug!(?linger, "Coordinator::resuspend: called");
        self.state().request_suspend(linger);
        self.kick()
    }

    /// Request resumption; cancels any lingering suspend immediately
    pub fn resume(&self) -> Completion {
        debug!("Coordinator::resume: called");
        self.state().request_resume();
        self.inner.timer.interrupt();
        self.kick()
    }

    /// Run the wakeup hook once, then suspend again after the wakeup linger
    ///
    /// Resolves immediately when the target is not currently Suspended.
    pub fn wakeup(&self) -> Completion {
        debug!("Coordinator::wakeup: called");
        if !self.state().request_wakeup() {
            debug!("Coordinator::wakeup: target not suspended, nothing to do");
            return Completion::ready();
        }
        self.inner.timer.interrupt();
        self.kick()
    }

    /// Wait until the coordinator is resumed; returns at once if it already is
    pub async fn wait_for_resumed(&self) {
        debug!("Coordinator::wait_for_resumed: called");
        self.inner.resumed.wait_for_resumed().await;
    }

    pub fn is_suspended(&self) -> bool {
        self.state().actual == Mode::Suspended
    }

    pub fn is_resumed(&self) -> bool {
        !self.is_suspended()
    }

    pub fn target(&self) -> Target {
        self.state().target
    }

    pub fn actual(&self) -> Mode {
        self.state().actual
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state().snapshot()
    }

    /// Start reconciling for the request just recorded
    ///
    /// When no transition is in flight the first step is committed before
    /// returning, so a request issued right after this one can interrupt
    /// that step but never erase it.
    fn kick(&self) -> Completion {
        let Ok(flight) = self.inner.flight.clone().try_lock_owned() else {
            debug!("Coordinator::kick: transition in flight, queueing");
            let this = self.clone();
            return Completion::running(tokio::spawn(async move { this.update().await }));
        };

        let Some(step) = self.state().begin() else {
            debug!("Coordinator::kick: already settled");
            return Completion::ready();
        };
        debug!(?step, "Coordinator::kick: committed");
        let this = self.clone();
        Completion::running(tokio::spawn(async move { this.reconcile(flight, step).await }))
    }

    /// Reconcile until the actual mode matches the target
    ///
    /// Joins behind an in-flight reconciliation if there is one, and returns
    /// without doing anything if that one already satisfied the target.
    pub async fn update(&self) -> CoordinatorResult<()> {
        debug!("Coordinator::update: called");
        let flight = self.inner.flight.clone().lock_owned().await;
        let Some(step) = self.state().begin() else {
            debug!("Coordinator::update: already settled");
            return Ok(());
        };
        self.reconcile(flight, step).await
    }

    async fn reconcile(&self, _flight: OwnedMutexGuard<()>, first: Step) -> CoordinatorResult<()> {
        let _updating = PhaseFlag::raise(&self.inner.state, Phase::Updating);
        let mut step = Some(first);
        while let Some(current) = step {
            match current {
                Step::Suspend { resumes, linger } => self.run_suspend(resumes, linger).await?,
                Step::Resume => self.run_resume().await?,
                Step::Wakeup => self.run_wakeup().await?,
            }
            step = self.state().next_step();
        }
        debug!(actual = %self.actual(), "Coordinator::reconcile: settled");
        Ok(())
    }

    async fn run_suspend(&self, resumes: u64, linger: Duration) -> CoordinatorResult<()> {
        let inner = &*self.inner;
        let outcome = {
            let _phase = PhaseFlag::raise(&inner.state, Phase::Suspending);
            let window = GraceWindow {
                state: &inner.state,
                timer: &inner.timer,
                hooks: inner.hooks.as_ref(),
                config: &inner.config,
            };
            let outcome = window.run(resumes, linger).await?;
            match outcome {
                GraceOutcome::Cancelled => inner
                    .hooks
                    .suspend_cancelled()
                    .await
                    .map_err(|e| hook_failed(HookKind::SuspendCancelled, e))?,
                GraceOutcome::Completed => inner
                    .hooks
                    .suspend()
                    .await
                    .map_err(|e| hook_failed(HookKind::Suspend, e))?,
            }
            outcome
        };

        match outcome {
            GraceOutcome::Cancelled => info!("Suspend cancelled"),
            GraceOutcome::Completed => {
                {
                    let mut s = self.state();
                    s.suspended_at = Utc::now();
                    s.actual = Mode::Suspended;
                    s.awake = false;
                }
                inner.resumed.publish(Mode::Suspended);
                info!("Suspended");
            }
        }
        Ok(())
    }

    async fn run_resume(&self) -> CoordinatorResult<()> {
        let inner = &*self.inner;
        {
            let _phase = PhaseFlag::raise(&inner.state, Phase::Resuming);
            self.state().resumed_at = Utc::now();
            inner.hooks.resume().await.map_err(|e| hook_failed(HookKind::Resume, e))?;
        }

        {
            let mut s = self.state();
            s.actual = Mode::Resumed;
            s.awake = false;
        }
        inner.resumed.publish(Mode::Resumed);
        info!("Resumed");
        Ok(())
    }

    async fn run_wakeup(&self) -> CoordinatorResult<()> {
        let inner = &*self.inner;
        {
            let _phase = PhaseFlag::raise(&inner.state, Phase::Waking);
            self.state().woken_at = Utc::now();
            inner.hooks.wakeup().await.map_err(|e| hook_failed(HookKind::Wakeup, e))?;
        }

        let mut s = self.state();
        s.awake = true;
        if s.target == Target::WakingUp {
            let linger = inner.config.wakeup_linger();
            debug!(?linger, "Coordinator::run_wakeup: re-requesting suspend");
            s.request_suspend(linger);
        }
        info!("Woke up");
        Ok(())
    }
}

fn hook_failed(hook: HookKind, source: eyre::Report) -> CoordinatorError {
    warn!(%hook, error = %source, "Hook failed, transition abandoned");
    CoordinatorError::hook(hook, source)
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::with_hooks(NoopHooks)
    }
}
