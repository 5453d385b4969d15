//! The hook pipeline.
//!
//! ```text
//! before ──error──────────────────────────────┐
//!   │ result ─────────────┐                   │
//!   ▼                     ▼                   ▼
//! dispatch ──success──► after ──error/none──► error ──► Err(surfaced)
//!   │                     │
//!   └──failure────────────┼───────────────────┘
//!                         └──result──► Ok(response)
//! ```
//!
//! Hooks of a phase run strictly one after another. Outside the error phase
//! a context carrying an error stops the phase. In the error phase every
//! hook runs; the last error set wins and the originating error is the
//! fallback when a hook clears it.

use crate::context::{HookContext, HookKind};
use crate::registry::{HookSnapshot, SharedHook};
use crate::wrapper::ServiceWrapper;
use feathers_core::{FeathersError, Method, Response};
use tracing::{Instrument, debug, info_span, warn};

/// Fold `hooks` over `context`.
///
/// `Err` from a hook ends the phase immediately.
pub(crate) async fn run_phase(
    hooks: &[SharedHook],
    mut context: HookContext,
) -> Result<HookContext, FeathersError> {
    for hook in hooks {
        if context.kind() != HookKind::Error && context.error.is_some() {
            break;
        }
        context = hook.run_dyn(context).await?;
    }
    Ok(context)
}

/// Run one call through the hooks registered on `service`.
pub(crate) async fn execute(service: &ServiceWrapper, method: Method) -> Result<Response, FeathersError> {
    let span = info_span!("feathers.request", path = service.path(), method = %method.verb());
    async move {
        let hooks = service.hook_snapshot();
        match dispatch(service, &hooks, method.clone()).await {
            Ok(response) => {
                debug!("call succeeded");
                Ok(response)
            }
            Err(originating) => Err(recover(service, &hooks, method, originating).await),
        }
    }
    .instrument(span)
    .await
}

/// Before hooks, transport, after hooks. Any failure is handed back as the
/// originating error.
async fn dispatch(
    service: &ServiceWrapper,
    hooks: &HookSnapshot,
    method: Method,
) -> Result<Response, FeathersError> {
    let verb = method.verb();
    let before = HookContext::new(HookKind::Before, service.clone(), method);
    let mut context = run_phase(&hooks.before.for_verb(verb), before).await?;
    if let Some(error) = context.error.take() {
        debug!(%error, "before hooks failed the call");
        return Err(error);
    }

    let result = match context.result.take() {
        Some(result) => {
            debug!("before hooks supplied a result, skipping transport");
            result
        }
        None => service.dispatch(context.method.clone()).await?,
    };

    let after = context.into_phase(HookKind::After).with_result(result);
    let mut context = run_phase(&hooks.after.for_verb(verb), after).await?;
    if let Some(error) = context.error.take() {
        debug!(%error, "after hooks failed the call");
        return Err(error);
    }
    context.result.take().ok_or_else(|| {
        warn!("after hooks left neither a result nor an error");
        FeathersError::Unknown
    })
}

/// Error hooks. Always yields the error to surface.
async fn recover(
    service: &ServiceWrapper,
    hooks: &HookSnapshot,
    method: Method,
    originating: FeathersError,
) -> FeathersError {
    let chain = hooks.error.for_verb(method.verb());
    warn!(error = %originating, hooks = chain.len(), "call failed, running error hooks");

    let context = HookContext::new(HookKind::Error, service.clone(), method).with_error(originating.clone());
    match run_phase(&chain, context).await {
        Ok(context) => context.error.unwrap_or(originating),
        Err(error) => {
            debug!(%error, "error hook raised");
            error
        }
    }
}
