//! Hooks: interceptors run around every service call.

use crate::context::HookContext;
use feathers_core::FeathersError;
use futures::future::BoxFuture;
use std::future::Future;

/// An interceptor in the hook pipeline.
///
/// A hook receives the context of the current phase and returns it, possibly
/// with `method`, `result` or `error` changed. Returning `Err` fails the call
/// the same way a transport failure does; in the error phase it ends the
/// error chain and the returned error is surfaced.
///
/// # Example
///
/// ```rust,ignore
/// use feathers::prelude::*;
///
/// struct StampHook;
///
/// impl Hook for StampHook {
///     async fn run(&self, mut context: HookContext) -> Result<HookContext, FeathersError> {
///         if let Method::Create { data, .. } = &mut context.method {
///             data.insert("createdBy".into(), "client".into());
///         }
///         Ok(context)
///     }
/// }
/// ```
///
/// This trait uses native `async fn` for static dispatch. Registration sets
/// store hooks as [`DynHook`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Hook`",
    label = "missing `Hook` implementation",
    note = "Hooks must implement `run(HookContext) -> Result<HookContext, FeathersError>`."
)]
pub trait Hook: Send + Sync + 'static {
    /// Run the hook.
    fn run(
        &self,
        context: HookContext,
    ) -> impl Future<Output = Result<HookContext, FeathersError>> + Send;
}

/// Dynamic object-safe version of [`Hook`].
pub trait DynHook: Send + Sync + 'static {
    /// Run the hook behind a boxed future.
    fn run_dyn(&self, context: HookContext) -> BoxFuture<'_, Result<HookContext, FeathersError>>;
}

// Blanket implementation: Any type implementing Hook implements DynHook automatically.
impl<T: Hook> DynHook for T {
    fn run_dyn(&self, context: HookContext) -> BoxFuture<'_, Result<HookContext, FeathersError>> {
        Box::pin(self.run(context))
    }
}

/// A hook built from a closure. See [`hook_fn`].
#[derive(Clone)]
pub struct HookFn<F> {
    f: F,
}

/// Turn an async closure into a [`Hook`].
///
/// ```rust,ignore
/// let hook = hook_fn(|context: HookContext| async move {
///     tracing::info!(path = context.path(), "calling");
///     Ok(context)
/// });
/// ```
pub fn hook_fn<F, Fut>(f: F) -> HookFn<F>
where
    F: Fn(HookContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HookContext, FeathersError>> + Send,
{
    HookFn { f }
}

impl<F, Fut> Hook for HookFn<F>
where
    F: Fn(HookContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HookContext, FeathersError>> + Send,
{
    fn run(
        &self,
        context: HookContext,
    ) -> impl Future<Output = Result<HookContext, FeathersError>> + Send {
        (self.f)(context)
    }
}
