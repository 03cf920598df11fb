//! Interruptible linger timer
//!
//! A single outstanding sleep per coordinator. `interrupt` resolves the
//! sleeper early with [`SleepOutcome::Interrupted`]; starting a new sleep
//! invalidates whatever sleep was outstanding before it.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

/// How a linger sleep ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Elapsed,
    Interrupted,
}

struct PendingSleep {
    id: u64,
    cancel: oneshot::Sender<()>,
}

#[derive(Default)]
struct TimerSlot {
    next_id: u64,
    pending: Option<PendingSleep>,
}

/// Cancellable delay used by the suspend grace procedure
#[derive(Default)]
pub struct LingerTimer {
    slot: Mutex<TimerSlot>,
}

impl LingerTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, TimerSlot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sleep for `duration` unless interrupted first
    ///
    /// `keep` is checked once the sleep is registered; if it fails the
    /// sleep returns `Interrupted` straight away.
    ///
    /// An interrupt issued after a state change is then never lost: either
    /// `keep` observes the change or the interrupt finds the sleep.
    pub async fn sleep_while(&self, duration: Duration, keep: impl FnOnce() -> bool) -> SleepOutcome {
        debug!(?duration, "LingerTimer::sleep: called");
        let (cancel, cancelled) = oneshot::channel();
        let id = {
            let mut slot = self.slot();
            slot.next_id += 1;
            let id = slot.next_id;
            // Dropping the previous sender wakes its sleeper as interrupted
            slot.pending = Some(PendingSleep { id, cancel });
            id
        };

        let outcome = if keep() {
            tokio::select! {
                _ = tokio::time::sleep(duration) => SleepOutcome::Elapsed,
                _ = cancelled => SleepOutcome::Interrupted,
            }
        } else {
            SleepOutcome::Interrupted
        };

        let mut slot = self.slot();
        if slot.pending.as_ref().is_some_and(|p| p.id == id) {
            slot.pending = None;
        }
        debug!(?outcome, "LingerTimer::sleep: done");
        outcome
    }

    /// Cut the outstanding sleep short; returns false when nothing was sleeping
    pub fn interrupt(&self) -> bool {
        let pending = self.slot().pending.take();
        match pending {
            Some(p) => {
                debug!(id = p.id, "LingerTimer::interrupt: cancelling outstanding sleep");
                let _ = p.cancel.send(());
                true
            }
            None => {
                debug!("LingerTimer::interrupt: no outstanding sleep");
                false
            }
        }
    }

    #[cfg(test)]
    fn is_sleeping(&self) -> bool {
        self.slot().pending.is_some()
    }
}
