//! Connection registry
//!
//! ## 責務
//!
//! - 接続中の `Connection` の管理（register / deregister）
//! - 接続へのフレーム送信（send_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! UI 層は sender を持つ `Connection` をここに登録し、以降の送信は全てこの
//! レジストリ経由で行います。内部の `HashMap` に直接触れる経路はありません。
//!
//! 送信は非ブロッキングなチャネル push なので、broadcast はロックを保持した
//! まま一貫したスナップショットを走査します。

use std::collections::{HashMap, hash_map::Entry};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{
        BroadcastReport, BroadcastTarget, Connection, ConnectionId, Message, PublishError,
        RegistryError,
    },
    infrastructure::dto::websocket::WireFrame,
};

/// Concurrency-safe set of live connections for one endpoint
pub struct ConnectionRegistry {
    /// Endpoint label used in logs
    name: &'static str,
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl ConnectionRegistry {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            connections: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Add a connection.
    ///
    /// A duplicate id means two accepts produced the same identity, which is
    /// a programming error.
    pub async fn register(&self, connection: Connection) -> Result<(), RegistryError> {
        let id = connection.id();
        let mut connections = self.connections.lock().await;
        match connections.entry(id) {
            Entry::Occupied(_) => {
                tracing::error!("[{}] connection '{}' registered twice", self.name, id);
                Err(RegistryError::DuplicateConnection(id))
            }
            Entry::Vacant(slot) => {
                slot.insert(connection);
                tracing::debug!(
                    "[{}] connection '{}' registered (total: {})",
                    self.name,
                    id,
                    connections.len()
                );
                Ok(())
            }
        }
    }

    /// Queue `greeting` on the connection, then register it.
    ///
    /// The greeting is therefore the first frame the peer sees; no broadcast
    /// can overtake it. A failed greeting is logged and does not prevent
    /// registration.
    pub async fn register_greeted(
        &self,
        connection: Connection,
        greeting: &Message,
    ) -> Result<(), RegistryError> {
        match WireFrame::from(greeting).encode() {
            Ok(frame) => {
                if let Err(e) = connection.send(frame) {
                    tracing::warn!("[{}] greeting not delivered: {}", self.name, e);
                }
            }
            Err(e) => tracing::warn!("[{}] failed to encode greeting: {}", self.name, e),
        }
        self.register(connection).await
    }

    /// Remove a connection if present.
    ///
    /// Idempotent: removing an absent id returns `None`.
    pub async fn deregister(&self, id: ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(&id).map(|mut connection| {
            connection.mark_disconnected();
            connection
        });
        if removed.is_some() {
            tracing::debug!(
                "[{}] connection '{}' deregistered (total: {})",
                self.name,
                id,
                connections.len()
            );
        }
        removed
    }

    /// Push an already encoded frame to one connection
    pub async fn send_to(&self, id: ConnectionId, frame: String) -> Result<(), RegistryError> {
        let connections = self.connections.lock().await;
        match connections.get(&id) {
            Some(connection) => connection.send(frame),
            None => Err(RegistryError::ConnectionNotFound(id)),
        }
    }

    /// Encode `message` and push it to one connection
    pub async fn send_message(&self, id: ConnectionId, message: &Message) -> Result<(), PublishError> {
        let frame = WireFrame::from(message).encode()?;
        self.send_to(id, frame).await?;
        Ok(())
    }

    /// Push an already encoded frame to every registered connection.
    ///
    /// Best effort: a failed send is logged and counted, never retried, and
    /// never removes the connection. That happens only when its own receive
    /// loop sees the close.
    pub async fn broadcast_frame(&self, frame: &str) -> BroadcastReport {
        let connections = self.connections.lock().await;
        let mut report = BroadcastReport::default();

        for (id, connection) in connections.iter() {
            report.attempted += 1;
            match connection.send(frame.to_string()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("[{}] {}", self.name, e);
                }
            }
            tracing::trace!("[{}] broadcast frame to '{}'", self.name, id);
        }

        report
    }

    /// Encode `message` once and push it to every registered connection
    pub async fn broadcast(&self, message: &Message) -> Result<BroadcastReport, PublishError> {
        let frame = WireFrame::from(message).encode()?;
        Ok(self.broadcast_frame(&frame).await)
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.lock().await.contains_key(&id)
    }

    /// Ids of the registered connections, in no particular order
    pub async fn ids(&self) -> Vec<ConnectionId> {
        self.connections.lock().await.keys().copied().collect()
    }
}

#[async_trait]
impl BroadcastTarget for ConnectionRegistry {
    async fn publish(&self, message: &Message) -> Result<BroadcastReport, PublishError> {
        self.broadcast(message).await
    }
}
