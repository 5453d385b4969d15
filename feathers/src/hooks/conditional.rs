//! Conditional Hook - Execute hooks based on the call.

use crate::context::HookContext;
use crate::hook::Hook;
use feathers_core::FeathersError;

/// A Hook that conditionally executes an inner Hook.
///
/// The inner hook only runs when `condition(&context)` returns `true`;
/// otherwise the context is passed on unchanged.
///
/// # Example
///
/// ```rust,ignore
/// // Only stamp bulk patches
/// let bulk_only = ConditionalHook::new(
///     |context: &HookContext| context.method.id().is_none(),
///     StampHook,
/// );
/// ```
pub struct ConditionalHook<C, H> {
    condition: C,
    inner: H,
}

impl<C, H> ConditionalHook<C, H> {
    /// Create a new `ConditionalHook`.
    pub fn new(condition: C, inner: H) -> Self {
        Self { condition, inner }
    }
}

impl<C, H> Hook for ConditionalHook<C, H>
where
    C: Fn(&HookContext) -> bool + Send + Sync + 'static,
    H: Hook,
{
    async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
        if (self.condition)(&context) {
            self.inner.run(context).await
        } else {
            Ok(context)
        }
    }
}

/// A Hook that executes one of two inner hooks based on a condition.
pub struct BranchHook<C, T, E> {
    condition: C,
    then_hook: T,
    else_hook: E,
}

impl<C, T, E> BranchHook<C, T, E> {
    /// Create a new `BranchHook`.
    pub fn new(condition: C, then_hook: T, else_hook: E) -> Self {
        Self {
            condition,
            then_hook,
            else_hook,
        }
    }
}

impl<C, T, E> Hook for BranchHook<C, T, E>
where
    C: Fn(&HookContext) -> bool + Send + Sync + 'static,
    T: Hook,
    E: Hook,
{
    async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
        if (self.condition)(&context) {
            self.then_hook.run(context).await
        } else {
            self.else_hook.run(context).await
        }
    }
}
