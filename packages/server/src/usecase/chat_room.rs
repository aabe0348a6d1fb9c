//! UseCase: chat room
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ChatRoom::relay() が送信者を含む全参加者に届くこと
//! - ChatRoom::leave() の退出通知が残りの参加者にだけ 1 回届くこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：3 人の参加者の発言と退出
//! - エッジケース：最後の参加者の退出、二重退出

use std::sync::Arc;

use kairo_shared::time::Clock;

use crate::{
    domain::{
        BroadcastReport, Connection, ConnectionId, Message, PublishError, PusherChannel,
        RegistryError,
    },
    infrastructure::ConnectionRegistry,
};

pub const DEPARTURE_NOTICE: &str = "A user has left the chat";

/// Broadcast room relaying every message to every participant.
///
/// The sender is included in its own relay, so each participant sees the
/// room's messages in one consistent order.
pub struct ChatRoom {
    registry: Arc<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl ChatRoom {
    pub fn new(registry: Arc<ConnectionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Add a participant and tell it which identity it was given
    pub async fn join(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError> {
        let id = ConnectionId::generate();
        let now = self.clock.now();
        let welcome = Message::welcome(format!("Joined the chat as {}", id), now);
        self.registry
            .register_greeted(Connection::new(id, sender, now), &welcome)
            .await?;
        tracing::info!(
            "Participant '{}' joined the chat ({} present)",
            id,
            self.registry.len().await
        );
        Ok(id)
    }

    /// Relay inbound data from `from` to all participants, `from` included
    pub async fn relay(&self, from: ConnectionId, data: &str) -> Result<BroadcastReport, PublishError> {
        let message = Message::chat(from, data, self.clock.now());
        let report = self.registry.broadcast(&message).await?;
        tracing::debug!(
            "Relayed chat message from '{}' to {}/{} participants",
            from,
            report.delivered,
            report.attempted
        );
        Ok(report)
    }

    /// Remove a participant and announce the departure to the rest.
    ///
    /// Returns `None` when `id` had already left; no notice is sent twice.
    pub async fn leave(&self, id: ConnectionId) -> Option<BroadcastReport> {
        self.registry.deregister(id).await?;

        let notice = Message::system(DEPARTURE_NOTICE, self.clock.now());
        match self.registry.broadcast(&notice).await {
            Ok(report) => {
                tracing::info!(
                    "Participant '{}' left the chat, notified {} participants",
                    id,
                    report.delivered
                );
                Some(report)
            }
            Err(e) => {
                tracing::warn!("Failed to broadcast departure of '{}': {}", id, e);
                None
            }
        }
    }

    pub async fn participant_count(&self) -> usize {
        self.registry.len().await
    }
}
