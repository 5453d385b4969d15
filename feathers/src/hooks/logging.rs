//! Logging Hook - request logging.

use crate::context::{HookContext, HookKind};
use crate::hook::Hook;
use feathers_core::FeathersError;
use tracing::{info, warn};

/// A Hook that logs every call it sees and passes the context on unchanged.
///
/// Register it in any phase; the phase is part of the log line. In the
/// error phase it logs at `warn`.
///
/// # Example
///
/// ```rust,ignore
/// let logging = LoggingHook::named("users");
/// app.service("users").hooks(
///     Some(Hooks::new().all(logging.clone())),
///     Some(Hooks::new().all(logging.clone())),
///     Some(Hooks::new().all(logging)),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct LoggingHook {
    name: &'static str,
}

impl LoggingHook {
    /// Create a new `LoggingHook` with a default name.
    pub fn new() -> Self {
        Self { name: "request" }
    }

    /// Create a new `LoggingHook` with a custom name.
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for LoggingHook {
    fn default() -> Self {
        Self::new()
    }
}

impl Hook for LoggingHook {
    async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
        let verb = context.method.verb();
        match (context.kind(), &context.error) {
            (HookKind::Error, Some(error)) => {
                warn!(name = self.name, path = context.path(), %verb, %error, "request failed");
            }
            (kind, _) => {
                info!(
                    name = self.name,
                    path = context.path(),
                    %verb,
                    %kind,
                    has_result = context.result.is_some(),
                    "request"
                );
            }
        }
        Ok(context)
    }
}
