//! Duplex transport over an event socket.
//!
//! [`SocketProvider`] drives any [`SocketClient`] (a Socket.IO style session
//! with acknowledged emissions) and maps every call onto one emission of
//! [`Endpoint::event_name`] with [`Endpoint::event_arguments`].
//!
//! # Connection lifecycle
//!
//! ```text
//! Disconnected ──connect──► Connecting ──ok──► Connected
//!      ▲                         │                 │
//!      └─────────error───────────┘   token change / drop
//! ```
//!
//! Calls never fail because the session is not up yet: every call first
//! waits on the connect queue, so concurrent calls share one handshake. When
//! the endpoint carries a token different from the one the session was
//! opened with, the session is torn down and reopened with the new token. An
//! emission lost to a dropped session is re-emitted once after reconnecting.

#[cfg(feature = "ws")]
pub mod ws;

use async_trait::async_trait;
use feathers_core::{BoxError, Endpoint, EventStream, FeathersError, Provider, Response, Url};
use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedSender};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Ack payload reported when the server never acknowledges an emission.
pub const NO_ACK: &str = "NO ACK";

/// Default ack timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Callback invoked with the payload of a server event.
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// State of the duplex session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session.
    Disconnected,
    /// Handshake in flight.
    Connecting,
    /// Ready to emit.
    Connected,
}

/// Failures of the duplex session.
#[derive(Error, Debug)]
pub enum SocketError {
    /// The session is closed or was dropped mid-emission.
    #[error("socket is not connected")]
    Disconnected,

    /// The server refused the connection.
    #[error("handshake rejected: {0}")]
    Handshake(String),

    /// A frame could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The underlying connection failed.
    #[error("socket transport error: {0}")]
    Transport(#[source] BoxError),
}

impl From<SocketError> for FeathersError {
    fn from(err: SocketError) -> Self {
        match err {
            SocketError::Handshake(_) => FeathersError::NotAuthenticated,
            other => FeathersError::underlying(other),
        }
    }
}

/// A Socket.IO style client session.
///
/// Implementations own the wire; [`SocketProvider`] owns the state machine.
#[async_trait]
pub trait SocketClient: Send + Sync + 'static {
    /// Open a session, passing `token` in the connection parameters.
    async fn connect(&self, token: Option<&str>) -> Result<(), SocketError>;

    /// Close the session. Pending acks resolve as [`SocketError::Disconnected`].
    async fn disconnect(&self);

    /// Emit `event` with `args` and wait for the server acknowledgement.
    async fn emit_with_ack(&self, event: &str, args: Vec<Value>) -> Result<Vec<Value>, SocketError>;

    /// Route payloads of `event` to `handler`, replacing any previous handler.
    fn on(&self, event: &str, handler: EventHandler);

    /// Stop routing `event`.
    fn off(&self, event: &str);
}

type Subscribers = Arc<Mutex<HashMap<String, Vec<UnboundedSender<Value>>>>>;

/// A [`Provider`] multiplexing every call over one duplex session.
pub struct SocketProvider<C> {
    base_url: Url,
    client: Arc<C>,
    timeout: Duration,
    connect_queue: tokio::sync::Mutex<()>,
    state: watch::Sender<ConnectionState>,
    session_token: Mutex<Option<String>>,
    subscribers: Subscribers,
}

impl<C: SocketClient> SocketProvider<C> {
    /// Create a provider over `client`. No connection is made until the
    /// first call.
    pub fn new(base_url: Url, client: C) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            base_url,
            client: Arc::new(client),
            timeout: DEFAULT_TIMEOUT,
            connect_queue: tokio::sync::Mutex::new(()),
            state,
            session_token: Mutex::new(None),
            subscribers: Arc::default(),
        }
    }

    /// Set the ack timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The socket client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Observe connection state transitions.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Open the session eagerly.
    pub async fn connect(&self, token: Option<&str>) -> Result<(), FeathersError> {
        self.ensure_connected(token).await.map_err(Into::into)
    }

    /// Close the session.
    pub async fn disconnect(&self) {
        let _queue = self.connect_queue.lock().await;
        self.client.disconnect().await;
        *self.session_token.lock() = None;
        self.state.send_replace(ConnectionState::Disconnected);
        info!("socket session closed");
    }

    /// Wait until a session opened with `token` is up.
    async fn ensure_connected(&self, token: Option<&str>) -> Result<(), SocketError> {
        let _queue = self.connect_queue.lock().await;

        let connected = self.state() == ConnectionState::Connected;
        let same_token = self.session_token.lock().as_deref() == token;
        if connected && same_token {
            return Ok(());
        }
        if connected {
            info!("access token changed, reopening socket session");
            self.client.disconnect().await;
        }

        self.state.send_replace(ConnectionState::Connecting);
        debug!("opening socket session");
        match self.client.connect(token).await {
            Ok(()) => {
                *self.session_token.lock() = token.map(str::to_owned);
                self.state.send_replace(ConnectionState::Connected);
                info!("socket session connected");
                Ok(())
            }
            Err(err) => {
                *self.session_token.lock() = None;
                self.state.send_replace(ConnectionState::Disconnected);
                warn!(error = %err, "socket connection failed");
                Err(err)
            }
        }
    }

    async fn emit_once(&self, event: &str, args: Vec<Value>) -> Result<Vec<Value>, SocketError> {
        match tokio::time::timeout(self.timeout, self.client.emit_with_ack(event, args)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(event, "ack timed out");
                Ok(vec![Value::String(NO_ACK.into())])
            }
        }
    }

    async fn emit(&self, endpoint: &Endpoint) -> Result<Response, FeathersError> {
        let token = endpoint.access_token();
        let event = endpoint.event_name();
        let args = endpoint.event_arguments();

        self.ensure_connected(token).await?;
        let ack = match self.emit_once(&event, args.clone()).await {
            Err(SocketError::Disconnected) => {
                debug!(%event, "session dropped during emission, re-emitting");
                self.state.send_if_modified(|state| {
                    let dropped = *state == ConnectionState::Connected;
                    if dropped {
                        *state = ConnectionState::Disconnected;
                    }
                    dropped
                });
                self.ensure_connected(token).await?;
                self.emit_once(&event, args).await?
            }
            other => other?,
        };
        parse_ack(ack)
    }
}

/// Classify an acknowledgement.
///
/// - `["NO ACK"]` → [`FeathersError::NotFound`]
/// - `[{code, ..}, ..]` → the classified error, or `Unknown`
/// - otherwise the last element is the payload
pub fn parse_ack(ack: Vec<Value>) -> Result<Response, FeathersError> {
    let Some(first) = ack.first() else {
        return Err(FeathersError::Unknown);
    };
    if first.as_str() == Some(NO_ACK) {
        return Err(FeathersError::NotFound);
    }
    if let Some(code) = first.as_object().and_then(|error| error.get("code")) {
        let error = code
            .as_u64()
            .and_then(|code| u16::try_from(code).ok())
            .and_then(FeathersError::from_status)
            .unwrap_or(FeathersError::Unknown);
        return Err(error);
    }
    match ack.into_iter().last() {
        Some(payload) => Response::from_json(payload),
        None => Err(FeathersError::Unknown),
    }
}

#[async_trait]
impl<C: SocketClient> Provider for SocketProvider<C> {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn supports_realtime_events(&self) -> bool {
        true
    }

    async fn request(&self, endpoint: &Endpoint) -> Result<Response, FeathersError> {
        self.emit(endpoint).await
    }

    fn on(&self, event: &str) -> EventStream {
        let (sender, receiver) = mpsc::unbounded();
        let first = {
            let mut subscribers = self.subscribers.lock();
            let senders = subscribers.entry(event.to_owned()).or_default();
            senders.push(sender);
            senders.len() == 1
        };

        if first {
            let subscribers = Arc::clone(&self.subscribers);
            let name = event.to_owned();
            self.client.on(
                event,
                Arc::new(move |payload| {
                    let mut subscribers = subscribers.lock();
                    if let Some(senders) = subscribers.get_mut(&name) {
                        senders.retain(|sender| sender.unbounded_send(payload.clone()).is_ok());
                    }
                }),
            );
        }
        receiver.boxed()
    }

    fn off(&self, event: &str) {
        self.subscribers.lock().remove(event);
        self.client.off(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSocketClient;
    use feathers_core::{AuthenticationConfiguration, Method, ResponseData};
    use serde_json::json;

    fn provider() -> SocketProvider<MockSocketClient> {
        SocketProvider::new(
            Url::parse("http://localhost:3030").unwrap(),
            MockSocketClient::new(),
        )
    }

    fn find(token: Option<&str>) -> Endpoint {
        Endpoint::new(
            Url::parse("http://localhost:3030").unwrap(),
            "messages",
            Method::Find { query: None },
            token.map(str::to_owned),
            AuthenticationConfiguration::default(),
        )
    }

    #[test]
    fn test_parse_ack_shapes() {
        assert_eq!(parse_ack(vec![json!(NO_ACK)]), Err(FeathersError::NotFound));
        assert_eq!(
            parse_ack(vec![json!({ "code": 401, "message": "nope" })]),
            Err(FeathersError::NotAuthenticated)
        );
        assert_eq!(parse_ack(vec![json!({ "code": 418 })]), Err(FeathersError::Unknown));
        assert_eq!(parse_ack(vec![]), Err(FeathersError::Unknown));

        let page = parse_ack(vec![
            Value::Null,
            json!({ "total": 1, "limit": 10, "skip": 0, "data": [{ "id": 1 }] }),
        ])
        .unwrap();
        assert_eq!(page.pagination.map(|p| p.limit), Some(10));
        assert_eq!(page.data, ResponseData::List(vec![json!({ "id": 1 })]));
    }

    #[tokio::test]
    async fn test_first_call_connects_and_emits() {
        let provider = provider();
        provider
            .client()
            .reply("messages::find", vec![Value::Null, json!([{ "text": "hi" }])]);
        assert_eq!(provider.state(), ConnectionState::Disconnected);

        let response = provider.request(&find(None)).await.unwrap();

        assert_eq!(response.as_list().map(<[Value]>::len), Some(1));
        assert_eq!(provider.state(), ConnectionState::Connected);
        assert_eq!(provider.client().connections(), vec![None]);
        assert_eq!(
            provider.client().emitted(),
            vec![("messages::find".to_owned(), vec![json!({})])]
        );
    }

    #[tokio::test]
    async fn test_token_rotation_reconnects() {
        let provider = provider();
        provider.client().reply("messages::find", vec![json!([])]);

        provider.request(&find(Some("first"))).await.unwrap();
        provider.request(&find(Some("first"))).await.unwrap();
        provider.request(&find(Some("second"))).await.unwrap();

        assert_eq!(
            provider.client().connections(),
            vec![Some("first".to_owned()), Some("second".to_owned())]
        );
        assert_eq!(provider.client().disconnects(), 1);
    }

    #[tokio::test]
    async fn test_dropped_emission_is_retried_once() {
        let provider = provider();
        provider.client().reply("messages::find", vec![json!({ "ok": true })]);
        provider.client().drop_next_emissions(1);

        let response = provider.request(&find(None)).await.unwrap();

        assert_eq!(response.into_value(), json!({ "ok": true }));
        assert_eq!(provider.client().connections().len(), 2);
        assert_eq!(provider.client().emitted().len(), 2);
    }

    #[tokio::test]
    async fn test_second_drop_surfaces_error() {
        let provider = provider();
        provider.client().drop_next_emissions(2);

        let err = provider.request(&find(None)).await.unwrap_err();
        assert!(matches!(err, FeathersError::Underlying(_)));
    }

    #[tokio::test]
    async fn test_rejected_handshake_is_not_authenticated() {
        let provider = provider();
        provider.client().reject_connections("invalid token");

        let result = provider.request(&find(Some("bad"))).await;

        assert_eq!(result, Err(FeathersError::NotAuthenticated));
        assert_eq!(provider.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_missing_ack_is_not_found() {
        let provider = provider().with_timeout(Duration::from_millis(50));
        provider.client().never_ack("messages::find");

        let result = provider.request(&find(None)).await;
        assert_eq!(result, Err(FeathersError::NotFound));
    }

    #[tokio::test]
    async fn test_realtime_fan_out_and_off() {
        let provider = provider();
        let mut every = provider.on("messages created");
        let mut single = provider.once("messages created");

        provider.client().push("messages created", json!({ "id": 1 }));
        provider.client().push("messages created", json!({ "id": 2 }));

        assert_eq!(every.next().await, Some(json!({ "id": 1 })));
        assert_eq!(every.next().await, Some(json!({ "id": 2 })));
        assert_eq!(single.next().await, Some(json!({ "id": 1 })));
        assert_eq!(single.next().await, None);

        provider.off("messages created");
        assert_eq!(every.next().await, None);
        assert!(!provider.client().has_handler("messages created"));
    }
}
