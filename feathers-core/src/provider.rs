//! Transport contract.
//!
//! A [`Provider`] turns an [`Endpoint`] into a [`Response`]. REST transports
//! answer every call independently; duplex transports additionally push
//! server events, which callers consume as [`EventStream`]s.
//!
//! # Realtime
//!
//! Providers that report [`Provider::supports_realtime_events`] deliver every
//! payload published on an event name to the streams returned by
//! [`Provider::on`] until [`Provider::off`] ends them. Streams from
//! [`Provider::once`] end after their first value. The default implementations
//! return streams that end immediately.

use crate::endpoint::Endpoint;
use crate::error::FeathersError;
use crate::response::Response;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::fmt;
use url::Url;

/// Stream of realtime payloads.
pub type EventStream = BoxStream<'static, Value>;

/// Server-pushed resource lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealTimeEvent {
    /// An entity was created.
    Created,
    /// An entity was replaced.
    Updated,
    /// An entity was patched.
    Patched,
    /// An entity was removed.
    Removed,
}

impl RealTimeEvent {
    /// Wire name of the event.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RealTimeEvent::Created => "created",
            RealTimeEvent::Updated => "updated",
            RealTimeEvent::Patched => "patched",
            RealTimeEvent::Removed => "removed",
        }
    }
}

impl fmt::Display for RealTimeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport to a Feathers server.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Feathers `Provider`",
    label = "missing `Provider` implementation",
    note = "Providers must implement `base_url` and `request`."
)]
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Server base address.
    fn base_url(&self) -> &Url;

    /// Whether [`on`](Provider::on)/[`once`](Provider::once) can ever yield.
    fn supports_realtime_events(&self) -> bool {
        false
    }

    /// Send one call.
    async fn request(&self, endpoint: &Endpoint) -> Result<Response, FeathersError>;

    /// Send the authentication call (`create` on the auth path).
    async fn authenticate(&self, endpoint: &Endpoint) -> Result<Response, FeathersError> {
        self.request(endpoint).await
    }

    /// Send the logout call (`remove` on the auth path).
    async fn logout(&self, endpoint: &Endpoint) -> Result<Response, FeathersError> {
        self.request(endpoint).await
    }

    /// Subscribe to every payload of `event` until [`off`](Provider::off).
    fn on(&self, _event: &str) -> EventStream {
        stream::empty().boxed()
    }

    /// Subscribe to the next payload of `event`.
    fn once(&self, event: &str) -> EventStream {
        self.on(event).take(1).boxed()
    }

    /// End every stream subscribed to `event`.
    fn off(&self, _event: &str) {}
}
