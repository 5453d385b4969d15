//! Timeout hook for time-limited execution.

use crate::context::HookContext;
use crate::hook::Hook;
use feathers_core::FeathersError;
use std::time::Duration;
use tokio::time::timeout;

/// A hook that wraps another hook with a timeout.
///
/// When the inner hook does not finish in time the call fails with
/// [`FeathersError::Timeout`].
///
/// # Example
///
/// ```rust,ignore
/// let guarded = TimeoutHook::millis(LookupHook::new(), 250);
/// app.service("orders").before(Hooks::new().create(guarded));
/// ```
pub struct TimeoutHook<H> {
    inner: H,
    duration: Duration,
}

impl<H> TimeoutHook<H> {
    /// Create a new timeout hook.
    pub fn new(inner: H, duration: Duration) -> Self {
        Self { inner, duration }
    }

    /// Create a timeout hook with a duration in seconds.
    pub fn secs(inner: H, secs: u64) -> Self {
        Self::new(inner, Duration::from_secs(secs))
    }

    /// Create a timeout hook with a duration in milliseconds.
    pub fn millis(inner: H, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Get the timeout duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Get a reference to the inner hook.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: Hook> Hook for TimeoutHook<H> {
    async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
        match timeout(self.duration, self.inner.run(context)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(duration = ?self.duration, "hook timed out");
                Err(FeathersError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HookKind;
    use crate::hooks::test_context;

    struct SleepyHook {
        delay: Duration,
    }

    impl Hook for SleepyHook {
        async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
            tokio::time::sleep(self.delay).await;
            Ok(context)
        }
    }

    #[test]
    fn test_timeout_hook_constructors() {
        struct DummyHook;
        assert_eq!(TimeoutHook::secs(DummyHook, 10).duration(), Duration::from_secs(10));
        assert_eq!(TimeoutHook::millis(DummyHook, 500).duration(), Duration::from_millis(500));
        let _ = TimeoutHook::new(DummyHook, Duration::from_secs(1)).inner();
    }

    #[tokio::test]
    async fn test_timeout_hook_completes_in_time() {
        let hook = TimeoutHook::secs(SleepyHook { delay: Duration::from_millis(1) }, 5);
        let context = hook.run(test_context(HookKind::Before)).await.unwrap();
        assert_eq!(context.kind(), HookKind::Before);
    }

    #[tokio::test]
    async fn test_timeout_hook_elapsed() {
        let hook = TimeoutHook::millis(SleepyHook { delay: Duration::from_secs(5) }, 10);
        let error = hook.run(test_context(HookKind::Before)).await.unwrap_err();
        assert_eq!(error, FeathersError::Timeout);
    }
}
