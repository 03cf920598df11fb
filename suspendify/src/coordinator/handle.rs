//! Completion - awaitable result of a transition request

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use super::error::{CoordinatorError, CoordinatorResult};

/// Resolves once the coordinator reaches a fixed point for the current target
///
/// The reconciliation runs on its own task, so dropping a `Completion` does
/// not cancel it; the request still takes effect.
#[must_use = "a Completion reports hook failures only when awaited"]
pub struct Completion {
    inner: Inner,
}

enum Inner {
    Ready,
    Running(JoinHandle<CoordinatorResult<()>>),
}

impl Completion {
    pub(crate) fn ready() -> Self {
        Self { inner: Inner::Ready }
    }

    pub(crate) fn running(task: JoinHandle<CoordinatorResult<()>>) -> Self {
        Self {
            inner: Inner::Running(task),
        }
    }

    /// Whether the request has already settled
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            Inner::Ready => true,
            Inner::Running(task) => task.is_finished(),
        }
    }
}

impl Future for Completion {
    type Output = CoordinatorResult<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            Inner::Ready => Poll::Ready(Ok(())),
            Inner::Running(task) => Pin::new(task).poll(cx).map(|joined| match joined {
                Ok(result) => result,
                Err(e) => Err(CoordinatorError::Aborted(e.to_string())),
            }),
        }
    }
}
