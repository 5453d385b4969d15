//! Re-authentication on expired tokens.

use crate::context::{HookContext, HookKind};
use crate::hook::Hook;
use feathers_core::{Data, FeathersError};
use tracing::{debug, info, warn};

/// Error hook that refreshes the session when a call is rejected as
/// [`FeathersError::NotAuthenticated`].
///
/// With a token in storage it authenticates again using the configured jwt
/// strategy and that token. The failed call is not retried: the caller still
/// receives `NotAuthenticated`, but the next call carries the refreshed
/// token. If re-authentication fails its error replaces the call's error
/// (and the stored token has been cleared).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReauthenticationHook;

impl ReauthenticationHook {
    /// Create a new `ReauthenticationHook`.
    pub fn new() -> Self {
        Self
    }
}

impl Hook for ReauthenticationHook {
    async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
        if context.kind() != HookKind::Error || context.error != Some(FeathersError::NotAuthenticated) {
            return Ok(context);
        }
        let app = context.app().clone();
        let Some(token) = app.access_token() else {
            debug!("no stored token, skipping re-authentication");
            return Ok(context);
        };

        let configuration = app.authentication_configuration();
        let mut credentials = Data::new();
        credentials.insert("strategy".into(), configuration.jwt_strategy.into());
        credentials.insert("accessToken".into(), token.into());

        match app.authenticate(credentials).await {
            Ok(_) => {
                info!(path = context.path(), "re-authenticated after rejected call");
                Ok(context)
            }
            Err(error) => {
                warn!(%error, "re-authentication failed");
                Ok(context.with_error(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Feathers;
    use crate::testing::StubProvider;
    use feathers_core::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn setup(token: Option<&str>) -> (Arc<StubProvider>, HookContext) {
        let provider = Arc::new(StubProvider::new(json!({})).with_token("fresh"));
        let app = Feathers::new(provider.clone());
        app.storage().set_access_token(token.map(str::to_owned));
        let context = HookContext::new(HookKind::Error, app.service("messages"), Method::Find { query: None })
            .with_error(FeathersError::NotAuthenticated);
        (provider, context)
    }

    #[tokio::test]
    async fn test_reauthenticates_with_stored_token() {
        let (provider, context) = setup(Some("stale"));
        let context = ReauthenticationHook::new().run(context).await.unwrap();

        assert_eq!(context.error, Some(FeathersError::NotAuthenticated));
        assert_eq!(context.app().access_token().as_deref(), Some("fresh"));

        let endpoint = provider.last_endpoint().unwrap();
        assert_eq!(endpoint.path(), "authentication");
        let body = endpoint.body().unwrap();
        assert_eq!(body["strategy"], "jwt");
        assert_eq!(body["accessToken"], "stale");
    }

    #[tokio::test]
    async fn test_skips_without_token() {
        let (provider, context) = setup(None);
        let context = ReauthenticationHook::new().run(context).await.unwrap();
        assert_eq!(context.error, Some(FeathersError::NotAuthenticated));
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_ignores_other_errors() {
        let (provider, context) = setup(Some("stale"));
        let context = context.with_error(FeathersError::NotFound);
        let context = ReauthenticationHook::new().run(context).await.unwrap();
        assert_eq!(context.error, Some(FeathersError::NotFound));
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_reauthentication_replaces_error() {
        let (provider, context) = setup(Some("stale"));
        provider.fail_with(FeathersError::Forbidden);
        let context = ReauthenticationHook::new().run(context).await.unwrap();
        assert_eq!(context.error, Some(FeathersError::Forbidden));
        assert_eq!(context.app().access_token(), None);
    }
}
