//! UseCase: echo channel
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 受信データの解釈（JSON → echo / それ以外 → raw_text）
//! - 応答が送信元の接続にだけ届くこと
//!
//! ### なぜこのテストが必要か
//! - 不正なデータを受け取ってもチャネルが終了しないことを保証する

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kairo_shared::time::Clock;

use crate::{
    domain::{Connection, ConnectionId, Message, PublishError, PusherChannel, RegistryError},
    infrastructure::ConnectionRegistry,
};

pub const ECHO_WELCOME: &str = "Connected to WebSocket server!";

/// Interpret one inbound unit of data.
///
/// Anything that parses as JSON is reflected back as `echo`; everything else
/// falls back to `raw_text`.
pub fn interpret_inbound(data: &str, now: DateTime<Utc>) -> Message {
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(received) => Message::echo(received, now),
        Err(e) => {
            tracing::debug!("Inbound data is not JSON, falling back to raw text: {}", e);
            Message::raw_text(data, now)
        }
    }
}

/// エコーチャネルのユースケース
pub struct EchoUseCase {
    registry: Arc<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl EchoUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Register a new peer and greet it
    pub async fn connect(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError> {
        let id = ConnectionId::generate();
        let now = self.clock.now();
        self.registry
            .register_greeted(
                Connection::new(id, sender, now),
                &Message::welcome(ECHO_WELCOME, now),
            )
            .await?;
        Ok(id)
    }

    /// Reply to one inbound unit of data, to its sender only
    pub async fn handle_inbound(&self, from: ConnectionId, data: &str) -> Result<(), PublishError> {
        let reply = interpret_inbound(data, self.clock.now());
        tracing::debug!("Echo reply to '{}' ({})", from, reply.kind());
        self.registry.send_message(from, &reply).await
    }

    pub async fn disconnect(&self, id: ConnectionId) {
        self.registry.deregister(id).await;
    }
}
