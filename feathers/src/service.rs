//! Services: what a path is bound to.

use crate::application::Feathers;
use async_trait::async_trait;
use feathers_core::{EventStream, FeathersError, Method, RealTimeEvent, Response};
use futures::StreamExt;
use futures::stream;

/// A resource behind a path.
///
/// Implement this to serve a path from something other than the
/// application's transport (a cache, a fixture, another API). Register it
/// with [`Feathers::use_service`]; calls made through the returned
/// [`ServiceWrapper`](crate::ServiceWrapper) run the path's hooks around
/// [`request`](Service::request) exactly as they would for a remote service.
///
/// # Example
///
/// ```rust,ignore
/// struct Fixtures;
///
/// #[async_trait]
/// impl Service for Fixtures {
///     async fn request(&self, _app: &Feathers, _path: &str, method: Method) -> Result<Response, FeathersError> {
///         match method {
///             Method::Get { id, .. } => Ok(Response::object(json!({ "id": id }))),
///             _ => Err(FeathersError::MethodNotAllowed),
///         }
///     }
/// }
///
/// let fixtures = app.use_service("fixtures", Fixtures);
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Feathers `Service`",
    label = "missing `Service` implementation",
    note = "Services must implement `request`."
)]
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Perform `method` against the resource at `path`.
    async fn request(&self, app: &Feathers, path: &str, method: Method) -> Result<Response, FeathersError>;

    /// Whether [`on`](Service::on) can ever yield.
    fn supports_realtime_events(&self, _app: &Feathers) -> bool {
        false
    }

    /// Every payload of `event` on `path` until [`off`](Service::off).
    fn on(&self, _app: &Feathers, _path: &str, _event: RealTimeEvent) -> EventStream {
        stream::empty().boxed()
    }

    /// The next payload of `event` on `path`.
    fn once(&self, app: &Feathers, path: &str, event: RealTimeEvent) -> EventStream {
        self.on(app, path, event).take(1).boxed()
    }

    /// End every stream of `event` on `path`.
    fn off(&self, _app: &Feathers, _path: &str, _event: RealTimeEvent) {}
}

/// The default service: forwards to the application's transport.
///
/// The endpoint is built when the call reaches the transport, with the token
/// stored at that moment. Realtime events are scoped as `"{path} {event}"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderService;

fn scoped(path: &str, event: RealTimeEvent) -> String {
    format!("{path} {event}")
}

#[async_trait]
impl Service for ProviderService {
    async fn request(&self, app: &Feathers, path: &str, method: Method) -> Result<Response, FeathersError> {
        let endpoint = app.endpoint(path, method);
        app.provider().request(&endpoint).await
    }

    fn supports_realtime_events(&self, app: &Feathers) -> bool {
        app.provider().supports_realtime_events()
    }

    fn on(&self, app: &Feathers, path: &str, event: RealTimeEvent) -> EventStream {
        app.provider().on(&scoped(path, event))
    }

    fn once(&self, app: &Feathers, path: &str, event: RealTimeEvent) -> EventStream {
        app.provider().once(&scoped(path, event))
    }

    fn off(&self, app: &Feathers, path: &str, event: RealTimeEvent) {
        app.provider().off(&scoped(path, event));
    }
}
