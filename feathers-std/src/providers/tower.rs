//! Tower integration.
//!
//! [`TowerProvider`] adapts any `tower::Service<Endpoint>` into a
//! [`Provider`], so middleware such as `tower::timeout`, `tower::limit` or a
//! hand-written in-process backend can stand in for a network transport.
//!
//! ```rust,ignore
//! let backend = tower::service_fn(|endpoint: Endpoint| async move {
//!     Ok::<_, FeathersError>(Response::object(json!({ "path": endpoint.path() })))
//! });
//! let provider = TowerProvider::new(base_url, backend);
//! ```

use async_trait::async_trait;
use feathers_core::{Endpoint, FeathersError, Provider, Response, Url};
use tower::{Service, ServiceExt};

/// Wraps a tower `Service` as a [`Provider`].
///
/// The service is cloned per call, following the usual tower convention for
/// shared services.
#[derive(Debug, Clone)]
pub struct TowerProvider<S> {
    base_url: Url,
    service: S,
}

impl<S> TowerProvider<S> {
    /// Create a new `TowerProvider`.
    pub fn new(base_url: Url, service: S) -> Self {
        Self { base_url, service }
    }

    /// Get a reference to the inner service.
    pub fn inner(&self) -> &S {
        &self.service
    }
}

#[async_trait]
impl<S> Provider for TowerProvider<S>
where
    S: Service<Endpoint, Response = Response, Error = FeathersError> + Clone + Send + Sync + 'static,
    S::Future: Send,
{
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn request(&self, endpoint: &Endpoint) -> Result<Response, FeathersError> {
        let mut service = self.service.clone();
        service.ready().await?.call(endpoint.clone()).await
    }
}
