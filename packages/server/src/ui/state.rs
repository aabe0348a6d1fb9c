//! Server state shared by the handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::usecase::{ChatRoom, EchoUseCase, PubSubHub, StatusUseCase, StreamUseCase};

/// Shared application state
pub struct AppState {
    /// EchoUseCase（エコーチャネル）
    pub echo_usecase: Arc<EchoUseCase>,
    /// ChatRoom（チャットルーム）
    pub chat_room: Arc<ChatRoom>,
    /// StreamUseCase（リアルタイム配信の購読）
    pub stream_usecase: Arc<StreamUseCase>,
    /// PubSubHub（pub/sub イベント）
    pub pubsub_hub: Arc<PubSubHub>,
    /// StatusUseCase（ステータス取得）
    pub status_usecase: Arc<StatusUseCase>,
    /// Cancelled once the server stops accepting; open sockets close on it
    pub closing: CancellationToken,
}
