//! Resume-wait signal
//!
//! Broadcasts the achieved mode to any number of waiters. Waiters block
//! until the mode is `Resumed`, without polling.

use tokio::sync::watch;
use tracing::debug;

use super::mode::Mode;

pub struct ResumeSignal {
    tx: watch::Sender<Mode>,
}

impl ResumeSignal {
    pub fn new(initial: Mode) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Publish a newly achieved mode; waiters wake only on `Resumed`
    pub fn publish(&self, mode: Mode) {
        debug!(%mode, waiters = self.tx.receiver_count(), "ResumeSignal::publish: called");
        self.tx.send_replace(mode);
    }

    /// Wait until the published mode is `Resumed`
    pub async fn wait_for_resumed(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail
        let _ = rx.wait_for(|mode| *mode == Mode::Resumed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolves_immediately_when_resumed() {
        let signal = ResumeSignal::new(Mode::Resumed);
        tokio::time::timeout(Duration::from_millis(100), signal.wait_for_resumed())
            .await
            .expect("should not block while resumed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_releases_all_waiters() {
        let signal = Arc::new(ResumeSignal::new(Mode::Suspended));
        let mut waiters = Vec::new();
        for _ in 0..4 {
            let signal = signal.clone();
            waiters.push(tokio::spawn(async move { signal.wait_for_resumed().await }));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(waiters.iter().all(|w| !w.is_finished()));

        signal.publish(Mode::Suspended);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(waiters.iter().all(|w| !w.is_finished()));

        signal.publish(Mode::Resumed);
        for waiter in waiters {
            waiter.await.unwrap();
        }
        assert_eq!(*signal.tx.borrow(), Mode::Resumed);
    }
}
