//! Standard hook implementations.

mod authentication;
mod conditional;
mod logging;
mod timeout;

pub use authentication::ReauthenticationHook;
pub use conditional::{BranchHook, ConditionalHook};
pub use logging::LoggingHook;
pub use timeout::TimeoutHook;

#[cfg(test)]
pub(crate) fn test_context(kind: crate::context::HookKind) -> crate::context::HookContext {
    use crate::testing::StubProvider;
    use crate::{Feathers, HookContext};
    use feathers_core::Method;
    use serde_json::json;
    use std::sync::Arc;

    let app = Feathers::new(Arc::new(StubProvider::new(json!({}))));
    HookContext::new(kind, app.service("messages"), Method::Find { query: None })
}
