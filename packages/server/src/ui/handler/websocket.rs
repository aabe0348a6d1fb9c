//! WebSocket connection handlers.
//!
//! Every endpoint runs the same socket loop: a writer task drains the
//! connection's outbound channel while the reader hands inbound text to the
//! endpoint's session. Whichever side finishes first aborts the other, and the
//! session is closed exactly once afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ConnectionId, PusherChannel, RegistryError},
    ui::state::AppState,
    usecase::{ChatRoom, EchoUseCase, PubSubHub, StreamUseCase},
};

/// Endpoint-specific behaviour of one socket
#[async_trait]
trait SocketSession: Send + Sync + 'static {
    /// Endpoint label used in logs
    fn label(&self) -> &'static str;

    async fn open(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError>;

    async fn on_text(&self, id: ConnectionId, text: &str);

    async fn close(&self, id: ConnectionId);
}

#[async_trait]
impl SocketSession for EchoUseCase {
    fn label(&self) -> &'static str {
        "echo"
    }

    async fn open(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError> {
        self.connect(sender).await
    }

    async fn on_text(&self, id: ConnectionId, text: &str) {
        if let Err(e) = self.handle_inbound(id, text).await {
            tracing::warn!("Failed to echo to '{}': {}", id, e);
        }
    }

    async fn close(&self, id: ConnectionId) {
        self.disconnect(id).await;
    }
}

#[async_trait]
impl SocketSession for ChatRoom {
    fn label(&self) -> &'static str {
        "chat"
    }

    async fn open(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError> {
        self.join(sender).await
    }

    async fn on_text(&self, id: ConnectionId, text: &str) {
        match self.relay(id, text).await {
            Ok(report) => tracing::debug!(
                "Relayed chat from '{}' to {}/{} participants",
                id,
                report.delivered,
                report.attempted
            ),
            Err(e) => tracing::warn!("Failed to relay chat from '{}': {}", id, e),
        }
    }

    async fn close(&self, id: ConnectionId) {
        self.leave(id).await;
    }
}

#[async_trait]
impl SocketSession for StreamUseCase {
    fn label(&self) -> &'static str {
        "realtime"
    }

    async fn open(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError> {
        self.subscribe(sender).await
    }

    async fn on_text(&self, id: ConnectionId, _text: &str) {
        // the stream is push-only
        tracing::trace!("Ignoring inbound frame from realtime subscriber '{}'", id);
    }

    async fn close(&self, id: ConnectionId) {
        self.unsubscribe(id).await;
    }
}

#[async_trait]
impl SocketSession for PubSubHub {
    fn label(&self) -> &'static str {
        "pubsub"
    }

    async fn open(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError> {
        self.subscribe(sender).await
    }

    async fn on_text(&self, id: ConnectionId, text: &str) {
        if let Err(e) = self.handle_request(id, text).await {
            tracing::warn!("Failed to answer pub/sub request from '{}': {}", id, e);
        }
    }

    async fn close(&self, id: ConnectionId) {
        self.unsubscribe(id).await;
    }
}

/// `GET /ws`: echo channel
pub async fn echo_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let session = state.echo_usecase.clone();
    let closing = state.closing.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, session, closing))
}

/// `GET /ws/realtime`: telemetry stream
pub async fn realtime_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let session = state.stream_usecase.clone();
    let closing = state.closing.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, session, closing))
}

/// `GET /ws/chat`: chat room
pub async fn chat_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let session = state.chat_room.clone();
    let closing = state.closing.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, session, closing))
}

/// `GET /pubsub`: event envelopes
pub async fn pubsub_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let session = state.pubsub_hub.clone();
    let closing = state.closing.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, session, closing))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The task ends when the channel closes (the connection was deregistered)
/// or the peer stops accepting frames.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket<S: SocketSession>(
    socket: WebSocket,
    session: Arc<S>,
    closing: CancellationToken,
) {
    let label = session.label();
    let (sender, mut receiver) = socket.split();

    // Outbound frames for this connection, greeting included
    let (tx, rx) = mpsc::unbounded_channel();
    let id = match session.open(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to open {} connection: {}", label, e);
            return;
        }
    };
    tracing::info!("{} connection '{}' opened", label, id);

    let mut send_task = pusher_loop(rx, sender);

    let recv_session = session.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on '{}': {}", id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text from '{}': {}", id, text.as_str());
                    recv_session.on_text(id, text.as_str()).await;
                }
                Message::Binary(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    recv_session.on_text(id, &text).await;
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                    tracing::trace!("Received ping from '{}'", id);
                }
                Message::Close(_) => {
                    tracing::debug!("'{}' requested close", id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
        _ = closing.cancelled() => {
            recv_task.abort();
            send_task.abort();
        }
    };

    session.close(id).await;
    tracing::info!("{} connection '{}' closed", label, id);
}
