//! Socket.IO v5 client over a websocket.
//!
//! Speaks Engine.IO v4 framing on the default namespace:
//!
//! | frame | meaning |
//! |-------|---------|
//! | `0{..}` | engine open |
//! | `2` / `3` | ping / pong |
//! | `40{..}` | namespace connect, sent with `{"token": ..}` auth |
//! | `44{..}` | connect refused |
//! | `42[name, ..]` | event, `42<id>[..]` when an ack is requested |
//! | `43<id>[..]` | acknowledgement |
//!
//! The token is also sent in the upgrade request under the configured
//! header, for servers that authenticate the transport itself.

use super::{EventHandler, SocketClient, SocketError};
use async_trait::async_trait;
use feathers_core::Url;
use futures::{SinkExt, Stream, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, trace, warn};

/// Default Socket.IO endpoint path.
pub const DEFAULT_PATH: &str = "/socket.io/";

/// A [`SocketClient`] over `tokio-tungstenite`.
pub struct WsSocketClient {
    base_url: Url,
    path: String,
    header: String,
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    session: Mutex<Option<Session>>,
    alive: AtomicBool,
    handlers: RwLock<HashMap<String, EventHandler>>,
    pending: Mutex<HashMap<u64, oneshot::Sender<Vec<Value>>>>,
    next_ack: AtomicU64,
}

struct Session {
    outgoing: mpsc::UnboundedSender<Message>,
    reader: JoinHandle<()>,
}

/// Removes an ack slot when the emission completes or is cancelled.
struct PendingAck<'a> {
    shared: &'a Shared,
    id: u64,
}

impl Drop for PendingAck<'_> {
    fn drop(&mut self) {
        self.shared.pending.lock().remove(&self.id);
    }
}

#[derive(Debug, PartialEq)]
enum Packet {
    Open,
    Close,
    Ping,
    Noop,
    Connect,
    ConnectError(Value),
    Disconnect,
    Event { name: String, args: Vec<Value> },
    Ack { id: u64, args: Vec<Value> },
}

impl WsSocketClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            path: DEFAULT_PATH.into(),
            header: "Authorization".into(),
            shared: Arc::default(),
        }
    }

    /// Set the Socket.IO endpoint path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the upgrade-request header carrying the token.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    fn socket_url(&self) -> Result<Url, SocketError> {
        let mut url = self.base_url.clone();
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|()| SocketError::Protocol(format!("cannot use {} as a websocket url", self.base_url)))?;
        url.set_path(&self.path);
        url.query_pairs_mut()
            .clear()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket");
        Ok(url)
    }
}

fn transport<E>(err: E) -> SocketError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SocketError::Transport(Box::new(err))
}

fn protocol(frame: &str) -> SocketError {
    SocketError::Protocol(format!("malformed frame: {frame}"))
}

fn decode(frame: &str) -> Result<Packet, SocketError> {
    match frame.as_bytes().first() {
        Some(b'0') => Ok(Packet::Open),
        Some(b'1') => Ok(Packet::Close),
        Some(b'2') => Ok(Packet::Ping),
        Some(b'3') | Some(b'6') => Ok(Packet::Noop),
        Some(b'4') => decode_message(frame),
        _ => Err(protocol(frame)),
    }
}

fn decode_message(frame: &str) -> Result<Packet, SocketError> {
    let kind = frame.as_bytes().get(1).copied().ok_or_else(|| protocol(frame))?;
    let rest = frame.get(2..).ok_or_else(|| protocol(frame))?;
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let (id, payload) = rest.split_at(digits);
    let id = if id.is_empty() {
        None
    } else {
        Some(id.parse::<u64>().map_err(|_| protocol(frame))?)
    };
    let payload: Value = if payload.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(payload).map_err(|_| protocol(frame))?
    };

    match kind {
        b'0' => Ok(Packet::Connect),
        b'1' => Ok(Packet::Disconnect),
        b'2' => {
            let Value::Array(mut args) = payload else {
                return Err(protocol(frame));
            };
            if args.is_empty() {
                return Err(protocol(frame));
            }
            let Value::String(name) = args.remove(0) else {
                return Err(protocol(frame));
            };
            Ok(Packet::Event { name, args })
        }
        b'3' => match (id, payload) {
            (Some(id), Value::Array(args)) => Ok(Packet::Ack { id, args }),
            _ => Err(protocol(frame)),
        },
        b'4' => Ok(Packet::ConnectError(payload)),
        _ => Err(protocol(frame)),
    }
}

async fn next_packet<S>(stream: &mut S) -> Result<Packet, SocketError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(frame))) => {
                trace!(%frame, "received");
                return decode(&frame);
            }
            Some(Ok(Message::Close(_))) | None => return Err(SocketError::Disconnected),
            Some(Ok(_)) => continue,
            Some(Err(err)) => return Err(transport(err)),
        }
    }
}

#[async_trait]
impl SocketClient for WsSocketClient {
    async fn connect(&self, token: Option<&str>) -> Result<(), SocketError> {
        self.disconnect().await;

        let url = self.socket_url()?;
        let mut request = url.as_str().into_client_request().map_err(transport)?;
        if let Some(token) = token {
            let name = HeaderName::from_bytes(self.header.as_bytes()).map_err(transport)?;
            let value = HeaderValue::from_str(token).map_err(transport)?;
            request.headers_mut().insert(name, value);
        }

        debug!(%url, "opening websocket");
        let (socket, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(transport)?;
        let (mut sink, mut stream) = socket.split();

        let connect_frame = match token {
            Some(token) => format!("40{}", json!({ "token": token })),
            None => "40".to_owned(),
        };
        loop {
            match next_packet(&mut stream).await? {
                Packet::Open => sink
                    .send(Message::Text(connect_frame.clone()))
                    .await
                    .map_err(transport)?,
                Packet::Ping => sink.send(Message::Text("3".into())).await.map_err(transport)?,
                Packet::Connect => break,
                Packet::ConnectError(reason) => {
                    let message = reason
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("connection refused");
                    return Err(SocketError::Handshake(message.to_owned()));
                }
                Packet::Close | Packet::Disconnect => return Err(SocketError::Disconnected),
                _ => {}
            }
        }

        let (outgoing, mut queue) = mpsc::unbounded_channel::<Message>();
        tokio::spawn(async move {
            while let Some(message) = queue.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
            sink.close().await.ok();
        });

        self.shared.alive.store(true, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let pong = outgoing.clone();
        let reader = tokio::spawn(async move {
            loop {
                let packet = match next_packet(&mut stream).await {
                    Ok(packet) => packet,
                    Err(SocketError::Protocol(reason)) => {
                        warn!(%reason, "dropping frame");
                        continue;
                    }
                    Err(err) => {
                        debug!(error = %err, "websocket reader stopped");
                        break;
                    }
                };
                match packet {
                    Packet::Ping => {
                        if pong.send(Message::Text("3".into())).is_err() {
                            break;
                        }
                    }
                    Packet::Event { name, args } => {
                        let handler = shared.handlers.read().get(&name).cloned();
                        if let Some(handler) = handler {
                            handler(args.into_iter().next().unwrap_or(Value::Null));
                        }
                    }
                    Packet::Ack { id, args } => {
                        let sender = shared.pending.lock().remove(&id);
                        if let Some(sender) = sender {
                            sender.send(args).ok();
                        }
                    }
                    Packet::Close | Packet::Disconnect => break,
                    _ => {}
                }
            }
            shared.alive.store(false, Ordering::Release);
            shared.pending.lock().clear();
        });

        *self.shared.session.lock() = Some(Session { outgoing, reader });
        debug!("socket.io namespace connected");
        Ok(())
    }

    async fn disconnect(&self) {
        let session = self.shared.session.lock().take();
        if let Some(session) = session {
            session.reader.abort();
            session.outgoing.send(Message::Text("41".into())).ok();
            debug!("websocket closed");
        }
        self.shared.alive.store(false, Ordering::Release);
        self.shared.pending.lock().clear();
    }

    async fn emit_with_ack(&self, event: &str, args: Vec<Value>) -> Result<Vec<Value>, SocketError> {
        let outgoing = self
            .shared
            .session
            .lock()
            .as_ref()
            .map(|session| session.outgoing.clone())
            .ok_or(SocketError::Disconnected)?;

        let id = self.shared.next_ack.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        self.shared.pending.lock().insert(id, sender);
        let _slot = PendingAck {
            shared: &self.shared,
            id,
        };
        if !self.shared.alive.load(Ordering::Acquire) {
            return Err(SocketError::Disconnected);
        }

        let mut frame = Vec::with_capacity(args.len() + 1);
        frame.push(Value::String(event.to_owned()));
        frame.extend(args);
        let text = format!("42{id}{}", Value::Array(frame));
        trace!(%text, "emitting");
        outgoing
            .send(Message::Text(text))
            .map_err(|_| SocketError::Disconnected)?;

        receiver.await.map_err(|_| SocketError::Disconnected)
    }

    fn on(&self, event: &str, handler: EventHandler) {
        self.shared.handlers.write().insert(event.to_owned(), handler);
    }

    fn off(&self, event: &str) {
        self.shared.handlers.write().remove(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    const OPEN: &str = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

    #[test]
    fn test_decode_frames() {
        assert_eq!(decode("2").unwrap(), Packet::Ping);
        assert_eq!(decode(r#"40{"sid":"x"}"#).unwrap(), Packet::Connect);
        assert_eq!(
            decode(r#"42["messages created",{"id":1}]"#).unwrap(),
            Packet::Event {
                name: "messages created".into(),
                args: vec![json!({ "id": 1 })]
            }
        );
        assert_eq!(
            decode(r#"4312[null,{"ok":true}]"#).unwrap(),
            Packet::Ack {
                id: 12,
                args: vec![Value::Null, json!({ "ok": true })]
            }
        );
        assert!(matches!(decode("43[1]"), Err(SocketError::Protocol(_))));
        assert!(matches!(decode("x"), Err(SocketError::Protocol(_))));
    }

    #[test]
    fn test_decode_rejects_non_ascii_packet_kind() {
        assert!(matches!(decode("4é[]"), Err(SocketError::Protocol(_))));
        assert!(matches!(decode("4"), Err(SocketError::Protocol(_))));
    }

    #[test]
    fn test_socket_url() {
        let client = WsSocketClient::new(Url::parse("https://api.example.com/v1").unwrap());
        assert_eq!(
            client.socket_url().unwrap().as_str(),
            "wss://api.example.com/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[tokio::test]
    async fn test_handshake_emit_and_push() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            ws.send(Message::Text(OPEN.into())).await.unwrap();

            let connect = ws.next().await.unwrap().unwrap().into_text().unwrap();
            frames_tx.send(connect).ok();
            ws.send(Message::Text(r#"40{"sid":"def"}"#.into())).await.unwrap();
            ws.send(Message::Text("2".into())).await.unwrap();

            while let Some(Ok(message)) = ws.next().await {
                let text = message.into_text().unwrap_or_default();
                if text.starts_with("420") {
                    ws.send(Message::Text(r#"42["messages created",{"id":1}]"#.into()))
                        .await
                        .unwrap();
                    ws.send(Message::Text(r#"430[null,[{"id":1}]]"#.into()))
                        .await
                        .unwrap();
                }
                frames_tx.send(text).ok();
            }
        });

        let client = WsSocketClient::new(Url::parse(&format!("http://{address}")).unwrap());
        let pushed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pushed);
        client.on(
            "messages created",
            Arc::new(move |payload| sink.lock().push(payload)),
        );

        client.connect(Some("secret")).await.unwrap();
        let ack = client
            .emit_with_ack("messages::find", vec![json!({})])
            .await
            .unwrap();

        assert_eq!(ack, vec![Value::Null, json!([{ "id": 1 }])]);
        assert_eq!(*pushed.lock(), vec![json!({ "id": 1 })]);

        let mut frames = Vec::new();
        while frames.len() < 3 {
            frames.push(frames_rx.recv().await.unwrap());
        }
        assert_eq!(frames[0], r#"40{"token":"secret"}"#);
        assert!(frames.contains(&"3".to_owned()));
        assert!(frames.contains(&r#"420["messages::find",{}]"#.to_owned()));

        client.disconnect().await;
        assert!(matches!(
            client.emit_with_ack("messages::find", vec![]).await,
            Err(SocketError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_refused_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            ws.send(Message::Text(OPEN.into())).await.unwrap();
            ws.next().await;
            ws.send(Message::Text(r#"44{"message":"jwt expired"}"#.into()))
                .await
                .unwrap();
            ws.next().await;
        });

        let client = WsSocketClient::new(Url::parse(&format!("http://{address}")).unwrap());
        let result = client.connect(Some("stale")).await;
        assert!(matches!(result, Err(SocketError::Handshake(reason)) if reason == "jwt expired"));
    }
}
