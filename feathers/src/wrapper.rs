//! Handles to registered services.

use crate::application::Feathers;
use crate::pipeline;
use crate::registry::{HookSnapshot, Hooks, ServiceHooks};
use crate::service::Service;
use feathers_core::{Data, EventStream, FeathersError, Method, Query, RealTimeEvent, Response};
use futures::StreamExt;
use futures::stream;
use std::fmt;
use std::sync::Arc;

/// A registered service: its path, implementation and hooks.
pub(crate) struct ServiceEntry {
    pub(crate) path: String,
    pub(crate) service: Arc<dyn Service>,
    pub(crate) hooks: ServiceHooks,
}

impl ServiceEntry {
    pub(crate) fn new(path: String, service: Arc<dyn Service>) -> Self {
        Self {
            path,
            service,
            hooks: ServiceHooks::default(),
        }
    }
}

/// A cheap handle to a service registered on a [`Feathers`] application.
///
/// Every call runs the service's hooks around the wrapped
/// [`Service::request`]. Handles for the same path share implementation and
/// hooks.
///
/// # Example
///
/// ```rust,ignore
/// let users = app.service("users");
/// users.before(Hooks::new().all(LoggingHook::new()));
///
/// let page = users.find(Some(Query::new().limit(10))).await?;
/// let bob = users.get("1", None).await?;
/// ```
#[derive(Clone)]
pub struct ServiceWrapper {
    app: Feathers,
    entry: Arc<ServiceEntry>,
}

impl ServiceWrapper {
    pub(crate) fn new(app: Feathers, entry: Arc<ServiceEntry>) -> Self {
        Self { app, entry }
    }

    /// Path the service is registered under.
    pub fn path(&self) -> &str {
        &self.entry.path
    }

    /// The owning application.
    pub fn app(&self) -> &Feathers {
        &self.app
    }

    /// Whether realtime subscriptions can yield.
    pub fn supports_realtime_events(&self) -> bool {
        self.entry.service.supports_realtime_events(&self.app)
    }

    /// Append hook registrations. Existing registrations are kept.
    pub fn hooks(&self, before: Option<Hooks>, after: Option<Hooks>, error: Option<Hooks>) -> &Self {
        self.entry.hooks.register(before, after, error);
        self
    }

    /// Append before hooks.
    pub fn before(&self, hooks: Hooks) -> &Self {
        self.hooks(Some(hooks), None, None)
    }

    /// Append after hooks.
    pub fn after(&self, hooks: Hooks) -> &Self {
        self.hooks(None, Some(hooks), None)
    }

    /// Append error hooks.
    pub fn error(&self, hooks: Hooks) -> &Self {
        self.hooks(None, None, Some(hooks))
    }

    /// Run `method` through the hook pipeline.
    pub async fn request(&self, method: Method) -> Result<Response, FeathersError> {
        pipeline::execute(self, method).await
    }

    /// Retrieve a list of resources, optionally filtered.
    pub async fn find(&self, query: Option<Query>) -> Result<Response, FeathersError> {
        self.request(Method::Find { query }).await
    }

    /// Retrieve one resource.
    pub async fn get(&self, id: impl Into<String>, query: Option<Query>) -> Result<Response, FeathersError> {
        self.request(Method::Get {
            id: id.into(),
            query,
        })
        .await
    }

    /// Create a resource.
    pub async fn create(&self, data: Data, query: Option<Query>) -> Result<Response, FeathersError> {
        self.request(Method::Create { data, query }).await
    }

    /// Replace one resource, or every resource matched by `query` when `id`
    /// is `None`.
    pub async fn update(
        &self,
        id: Option<&str>,
        data: Data,
        query: Option<Query>,
    ) -> Result<Response, FeathersError> {
        self.request(Method::Update {
            id: id.map(str::to_owned),
            data,
            query,
        })
        .await
    }

    /// Merge into one resource, or every resource matched by `query`.
    pub async fn patch(
        &self,
        id: Option<&str>,
        data: Data,
        query: Option<Query>,
    ) -> Result<Response, FeathersError> {
        self.request(Method::Patch {
            id: id.map(str::to_owned),
            data,
            query,
        })
        .await
    }

    /// Remove one resource, or every resource matched by `query`.
    pub async fn remove(&self, id: Option<&str>, query: Option<Query>) -> Result<Response, FeathersError> {
        self.request(Method::Remove {
            id: id.map(str::to_owned),
            query,
        })
        .await
    }

    /// Every payload of `event` on this path until [`off`](Self::off).
    ///
    /// Without realtime support the stream ends immediately.
    pub fn on(&self, event: RealTimeEvent) -> EventStream {
        if !self.supports_realtime_events() {
            return stream::empty().boxed();
        }
        self.entry.service.on(&self.app, self.path(), event)
    }

    /// The next payload of `event` on this path.
    pub fn once(&self, event: RealTimeEvent) -> EventStream {
        if !self.supports_realtime_events() {
            return stream::empty().boxed();
        }
        self.entry.service.once(&self.app, self.path(), event)
    }

    /// End every stream of `event` on this path.
    pub fn off(&self, event: RealTimeEvent) {
        if self.supports_realtime_events() {
            self.entry.service.off(&self.app, self.path(), event);
        }
    }

    /// Call the wrapped service directly, without hooks.
    pub(crate) async fn dispatch(&self, method: Method) -> Result<Response, FeathersError> {
        self.entry
            .service
            .request(&self.app, &self.entry.path, method)
            .await
    }

    pub(crate) fn hook_snapshot(&self) -> HookSnapshot {
        self.entry.hooks.snapshot()
    }
}

impl fmt::Debug for ServiceWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceWrapper")
            .field("path", &self.entry.path)
            .finish_non_exhaustive()
    }
}
