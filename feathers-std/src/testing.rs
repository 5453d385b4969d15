//! Testing utilities for the Feathers client.
//!
//! This module provides in-memory stand-ins for the network so services,
//! hooks and applications can be exercised without a server.
//!
//! # Features
//!
//! - [`StubProvider`]: A provider that echoes canned data and records every endpoint
//! - [`MockSocketClient`]: A scriptable [`SocketClient`] for driving a [`SocketProvider`]
//!
//! [`SocketProvider`]: crate::providers::socket::SocketProvider

use crate::providers::socket::{EventHandler, SocketClient, SocketError};
use async_trait::async_trait;
use feathers_core::{Endpoint, EventStream, FeathersError, Provider, Response, Url};
use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedSender};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use tokio::sync::watch;

// ============================================================================
// Stub Provider
// ============================================================================

/// A provider that answers every call with the same payload.
///
/// Every endpoint handed to it is recorded, so tests can assert on the token,
/// path and method a call was dispatched with.
///
/// # Example
///
/// ```rust,ignore
/// let provider = Arc::new(StubProvider::new(json!({ "name": "Bob" })));
/// let app = Feathers::new(provider.clone());
///
/// app.service("users").get("1", None).await?;
/// assert_eq!(provider.request_count(), 1);
/// ```
pub struct StubProvider {
    base_url: Url,
    data: Value,
    token: String,
    realtime: bool,
    failure: Mutex<Option<FeathersError>>,
    endpoints: Mutex<Vec<Endpoint>>,
    held: watch::Sender<bool>,
    subscribers: Mutex<HashMap<String, Vec<UnboundedSender<Value>>>>,
}

impl StubProvider {
    /// Base address every stub reports.
    pub const BASE_URL: &'static str = "http://myserver.com";

    /// Create a stub echoing `data`.
    pub fn new(data: Value) -> Self {
        let (held, _) = watch::channel(false);
        Self {
            base_url: Url::parse(Self::BASE_URL).expect("stub base url is valid"),
            data,
            token: "some_token".into(),
            realtime: false,
            failure: Mutex::new(None),
            endpoints: Mutex::new(Vec::new()),
            held,
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Token handed out by `authenticate`.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Report realtime support and deliver [`emit`](Self::emit)ted payloads.
    pub fn with_realtime(mut self) -> Self {
        self.realtime = true;
        self
    }

    /// Fail every following call with `error`.
    pub fn fail_with(&self, error: FeathersError) {
        *self.failure.lock() = Some(error);
    }

    /// Answer following calls successfully again.
    pub fn succeed(&self) {
        *self.failure.lock() = None;
    }

    /// Park requests after they are recorded until [`release`](Self::release).
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    /// Let parked requests complete.
    pub fn release(&self) {
        self.held.send_replace(false);
    }

    /// Every endpoint seen so far, in order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints.lock().clone()
    }

    /// The most recent endpoint.
    pub fn last_endpoint(&self) -> Option<Endpoint> {
        self.endpoints.lock().last().cloned()
    }

    /// Number of endpoints seen so far.
    pub fn request_count(&self) -> usize {
        self.endpoints.lock().len()
    }

    /// Publish `payload` on `event`. Returns how many streams received it.
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        let mut subscribers = self.subscribers.lock();
        let Some(senders) = subscribers.get_mut(event) else {
            return 0;
        };
        senders.retain(|sender| sender.unbounded_send(payload.clone()).is_ok());
        senders.len()
    }

    /// Number of live streams on `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.subscribers
            .lock()
            .get(event)
            .map_or(0, |senders| senders.iter().filter(|s| !s.is_closed()).count())
    }

    fn record(&self, endpoint: &Endpoint) -> Result<(), FeathersError> {
        self.endpoints.lock().push(endpoint.clone());
        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn supports_realtime_events(&self) -> bool {
        self.realtime
    }

    async fn request(&self, endpoint: &Endpoint) -> Result<Response, FeathersError> {
        self.endpoints.lock().push(endpoint.clone());
        let mut held = self.held.subscribe();
        held.wait_for(|held| !held).await.ok();

        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        Response::from_json(self.data.clone())
    }

    async fn authenticate(&self, endpoint: &Endpoint) -> Result<Response, FeathersError> {
        self.record(endpoint)?;
        Ok(Response::object(json!({ "accessToken": self.token })))
    }

    async fn logout(&self, endpoint: &Endpoint) -> Result<Response, FeathersError> {
        self.record(endpoint)?;
        Ok(Response::object(json!({})))
    }

    fn on(&self, event: &str) -> EventStream {
        if !self.realtime {
            return futures::stream::empty().boxed();
        }
        let (sender, receiver) = mpsc::unbounded();
        self.subscribers
            .lock()
            .entry(event.to_owned())
            .or_default()
            .push(sender);
        receiver.boxed()
    }

    fn off(&self, event: &str) {
        self.subscribers.lock().remove(event);
    }
}

// ============================================================================
// Mock Socket Client
// ============================================================================

#[derive(Default)]
struct MockState {
    connected: bool,
    reject: Option<String>,
    replies: HashMap<String, Vec<Value>>,
    silent: HashSet<String>,
    drops: usize,
    connections: Vec<Option<String>>,
    disconnects: usize,
    emitted: Vec<(String, Vec<Value>)>,
}

enum Outcome {
    Ack(Vec<Value>),
    Dropped,
    Silent,
}

/// A scriptable in-memory [`SocketClient`].
///
/// Unscripted events are acknowledged with `[null, {}]`.
///
/// # Example
///
/// ```rust,ignore
/// let client = MockSocketClient::new();
/// client.reply("messages::find", vec![Value::Null, json!([])]);
/// client.drop_next_emissions(1);
///
/// let provider = SocketProvider::new(base_url, client);
/// ```
#[derive(Default)]
pub struct MockSocketClient {
    state: Mutex<MockState>,
    handlers: Mutex<HashMap<String, EventHandler>>,
}

impl MockSocketClient {
    /// Create a client that accepts every connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acknowledge `event` with `ack`.
    pub fn reply(&self, event: &str, ack: Vec<Value>) {
        self.state.lock().replies.insert(event.to_owned(), ack);
    }

    /// Never acknowledge `event`.
    pub fn never_ack(&self, event: &str) {
        self.state.lock().silent.insert(event.to_owned());
    }

    /// Drop the session during the next `count` emissions.
    pub fn drop_next_emissions(&self, count: usize) {
        self.state.lock().drops = count;
    }

    /// Refuse every following handshake with `reason`.
    pub fn reject_connections(&self, reason: impl Into<String>) {
        self.state.lock().reject = Some(reason.into());
    }

    /// Deliver a server event to the registered handler.
    pub fn push(&self, event: &str, payload: Value) {
        let handler = self.handlers.lock().get(event).cloned();
        if let Some(handler) = handler {
            handler(payload);
        }
    }

    /// Whether a handler is registered for `event`.
    pub fn has_handler(&self, event: &str) -> bool {
        self.handlers.lock().contains_key(event)
    }

    /// Token of every connection attempt, in order.
    pub fn connections(&self) -> Vec<Option<String>> {
        self.state.lock().connections.clone()
    }

    /// Number of explicit disconnects.
    pub fn disconnects(&self) -> usize {
        self.state.lock().disconnects
    }

    /// Every emission attempt, in order.
    pub fn emitted(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().emitted.clone()
    }
}

#[async_trait]
impl SocketClient for MockSocketClient {
    async fn connect(&self, token: Option<&str>) -> Result<(), SocketError> {
        let mut state = self.state.lock();
        state.connections.push(token.map(str::to_owned));
        if let Some(reason) = state.reject.clone() {
            state.connected = false;
            return Err(SocketError::Handshake(reason));
        }
        state.connected = true;
        Ok(())
    }

    async fn disconnect(&self) {
        let mut state = self.state.lock();
        state.connected = false;
        state.disconnects += 1;
    }

    async fn emit_with_ack(&self, event: &str, args: Vec<Value>) -> Result<Vec<Value>, SocketError> {
        let outcome = {
            let mut state = self.state.lock();
            state.emitted.push((event.to_owned(), args));
            if !state.connected {
                Outcome::Dropped
            } else if state.drops > 0 {
                state.drops -= 1;
                state.connected = false;
                Outcome::Dropped
            } else if state.silent.contains(event) {
                Outcome::Silent
            } else {
                let ack = state
                    .replies
                    .get(event)
                    .cloned()
                    .unwrap_or_else(|| vec![Value::Null, json!({})]);
                Outcome::Ack(ack)
            }
        };

        match outcome {
            Outcome::Ack(ack) => Ok(ack),
            Outcome::Dropped => Err(SocketError::Disconnected),
            Outcome::Silent => futures::future::pending().await,
        }
    }

    fn on(&self, event: &str, handler: EventHandler) {
        self.handlers.lock().insert(event.to_owned(), handler);
    }

    fn off(&self, event: &str) {
        self.handlers.lock().remove(event);
    }
}
