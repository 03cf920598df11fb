//! Transition hooks supplied by the owner of a coordinator
//!
//! The coordinator decides *when* and *in what order* hooks fire; what they
//! do (closing sockets, flushing buffers, ...) is entirely up to the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use futures::future::BoxFuture;
use tracing::debug;

/// Callbacks invoked by the transition engine
///
/// Every method has a no-op default, so implementors only override the
/// phases they care about.
#[async_trait]
pub trait Hooks: Send + Sync {
    /// Runs once per resume transition
    async fn resume(&self) -> Result<()> {
        Ok(())
    }

    /// Runs once per completed suspend transition
    async fn suspend(&self) -> Result<()> {
        Ok(())
    }

    /// Runs when a lingering suspend is cancelled by a resume or wakeup
    async fn suspend_cancelled(&self) -> Result<()> {
        Ok(())
    }

    /// Runs once per wakeup transition
    async fn wakeup(&self) -> Result<()> {
        Ok(())
    }

    /// Oracle for the grace period still required before suspending
    ///
    /// `None` or a zero duration means no more waiting is needed. Only
    /// consulted when [`Hooks::pollable`] returns true.
    async fn poll_linger(&self) -> Result<Option<Duration>> {
        Ok(None)
    }

    /// Whether `poll_linger` should drive the grace period
    fn pollable(&self) -> bool {
        false
    }
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl Hooks for NoopHooks {}

type HookFn = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;
type PollFn = Arc<dyn Fn() -> BoxFuture<'static, Result<Option<Duration>>> + Send + Sync>;

/// [`Hooks`] assembled from plain closures
///
/// ```ignore
/// let hooks = HookSet::new()
///     .on_resume(|| async { reconnect().await })
///     .on_suspend(|| async { flush().await });
/// ```
#[derive(Clone, Default)]
pub struct HookSet {
    resume: Option<HookFn>,
    suspend: Option<HookFn>,
    suspend_cancelled: Option<HookFn>,
    wakeup: Option<HookFn>,
    poll_linger: Option<PollFn>,
}

fn boxed<F, Fut>(f: F) -> HookFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_resume<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.resume = Some(boxed(f));
        self
    }

    pub fn on_suspend<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.suspend = Some(boxed(f));
        self
    }

    pub fn on_suspend_cancelled<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.suspend_cancelled = Some(boxed(f));
        self
    }

    pub fn on_wakeup<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.wakeup = Some(boxed(f));
        self
    }

    /// Install a linger oracle; its presence enables adaptive backoff
    pub fn poll_linger_with<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Duration>>> + Send + 'static,
    {
        self.poll_linger = Some(Arc::new(move || Box::pin(f())));
        self
    }

    async fn call(hook: &Option<HookFn>) -> Result<()> {
        match hook {
            Some(f) => f().await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Hooks for HookSet {
    async fn resume(&self) -> Result<()> {
        debug!("HookSet::resume: called");
        Self::call(&self.resume).await
    }

    async fn suspend(&self) -> Result<()> {
        debug!("HookSet::suspend: called");
        Self::call(&self.suspend).await
    }

    async fn suspend_cancelled(&self) -> Result<()> {
        debug!("HookSet::suspend_cancelled: called");
        Self::call(&self.suspend_cancelled).await
    }

    async fn wakeup(&self) -> Result<()> {
        debug!("HookSet::wakeup: called");
        Self::call(&self.wakeup).await
    }

    async fn poll_linger(&self) -> Result<Option<Duration>> {
        debug!("HookSet::poll_linger: called");
        match &self.poll_linger {
            Some(f) => f().await,
            None => Ok(None),
        }
    }

    fn pollable(&self) -> bool {
        self.poll_linger.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_noop_hooks() {
        let hooks = NoopHooks;
        assert!(hooks.resume().await.is_ok());
        assert!(hooks.suspend().await.is_ok());
        assert!(hooks.poll_linger().await.unwrap().is_none());
        assert!(!hooks.pollable());
    }

    #[tokio::test]
    async fn test_hook_set_calls_closures() {
        let resumes = Arc::new(AtomicUsize::new(0));
        let counter = resumes.clone();
        let hooks = HookSet::new().on_resume(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        hooks.resume().await.unwrap();
        hooks.resume().await.unwrap();
        hooks.suspend().await.unwrap();
        assert_eq!(resumes.load(Ordering::SeqCst), 2);
        assert!(!hooks.pollable());
    }

    #[tokio::test]
    async fn test_hook_set_poll_linger() {
        let hooks = HookSet::new().poll_linger_with(|| async { Ok(Some(Duration::from_millis(100))) });
        assert!(hooks.pollable());
        assert_eq!(hooks.poll_linger().await.unwrap(), Some(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_hook_set_propagates_errors() {
        let hooks = HookSet::new().on_wakeup(|| async { Err(eyre::eyre!("radio off")) });
        let err = hooks.wakeup().await.unwrap_err();
        assert_eq!(err.to_string(), "radio off");
    }
}
