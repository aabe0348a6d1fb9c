//! UseCase: publish/subscribe hub
//!
//! ## プロトコル
//!
//! - 接続時: 新しい購読者にだけ `message` を送信
//! - `ping` → `pong`（要求者にだけ返信）
//! - `get_status` → `status_response`（要求者にだけ返信）
//! - 配信タスクからの `sensor_data` / `system_stats` は全購読者へ
//!
//! 解釈できない要求には `error` を返し、接続は維持します。

use std::sync::Arc;

use async_trait::async_trait;
use kairo_shared::time::{Clock, to_rfc3339};

use crate::{
    domain::{
        BroadcastReport, BroadcastTarget, Connection, ConnectionId, Message, PublishError,
        PusherChannel, RegistryError,
    },
    infrastructure::{
        ConnectionRegistry,
        dto::{
            http::StatusDto,
            pubsub::{ErrorData, EventEnvelope, PongData, WelcomeData, events},
            websocket::WireFrame,
        },
    },
};

use super::status::StatusUseCase;

pub const PUBSUB_WELCOME: &str = "Connected to server!";

fn encode_event<T: serde::Serialize>(event: &str, data: &T) -> Result<String, PublishError> {
    let envelope = EventEnvelope::new(event, serde_json::to_value(data)?);
    Ok(serde_json::to_string(&envelope)?)
}

/// Event hub for pub/sub subscribers
pub struct PubSubHub {
    registry: Arc<ConnectionRegistry>,
    status: Arc<StatusUseCase>,
    clock: Arc<dyn Clock>,
}

impl PubSubHub {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        status: Arc<StatusUseCase>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            status,
            clock,
        }
    }

    /// Register a subscriber and acknowledge it with its `sid`
    pub async fn subscribe(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError> {
        let id = ConnectionId::generate();
        let connection = Connection::new(id, sender, self.clock.now());

        let welcome = WelcomeData {
            data: PUBSUB_WELCOME.to_string(),
            sid: id.to_string(),
        };
        match encode_event(events::MESSAGE, &welcome) {
            Ok(frame) => {
                if let Err(e) = connection.send(frame) {
                    tracing::warn!("Failed to acknowledge subscriber '{}': {}", id, e);
                }
            }
            Err(e) => tracing::warn!("Failed to encode subscriber welcome: {}", e),
        }

        self.registry.register(connection).await?;
        tracing::info!("Subscriber '{}' connected", id);
        Ok(id)
    }

    /// Answer one request frame, to its sender only
    pub async fn handle_request(&self, from: ConnectionId, data: &str) -> Result<(), PublishError> {
        let frame = match serde_json::from_str::<EventEnvelope>(data) {
            Ok(request) => self.answer(request).await?,
            Err(e) => {
                tracing::debug!("Malformed pub/sub request from '{}': {}", from, e);
                encode_event(
                    events::ERROR,
                    &ErrorData {
                        message: format!("malformed event: {}", e),
                    },
                )?
            }
        };
        self.registry.send_to(from, frame).await?;
        Ok(())
    }

    async fn answer(&self, request: EventEnvelope) -> Result<String, PublishError> {
        match request.event.as_str() {
            events::PING => encode_event(
                events::PONG,
                &PongData {
                    timestamp: to_rfc3339(self.clock.now()),
                    data: request.data,
                },
            ),
            events::GET_STATUS => {
                let snapshot = self.status.execute().await;
                encode_event(events::STATUS_RESPONSE, &StatusDto::from(&snapshot))
            }
            other => encode_event(
                events::ERROR,
                &ErrorData {
                    message: format!("unknown event '{}'", other),
                },
            ),
        }
    }

    pub async fn unsubscribe(&self, id: ConnectionId) {
        if self.registry.deregister(id).await.is_some() {
            tracing::info!("Subscriber '{}' disconnected", id);
        }
    }
}

#[async_trait]
impl BroadcastTarget for PubSubHub {
    /// Broadcast as a named event; the event name is the message kind
    async fn publish(&self, message: &Message) -> Result<BroadcastReport, PublishError> {
        let data = WireFrame::from(message).to_value()?;
        let frame = serde_json::to_string(&EventEnvelope::new(message.kind().as_str(), data))?;
        Ok(self.registry.broadcast_frame(&frame).await)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        domain::{PayloadGenerator, SensorDataGenerator},
        infrastructure::{InMemoryResourceCounter, resource::inmemory::SEED_COUNTS},
        usecase::status::EndpointRegistries,
    };
    use kairo_shared::time::FixedClock;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn create_hub() -> (PubSubHub, EndpointRegistries) {
        let registries = EndpointRegistries::new();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::from_millis(1_704_067_200_000));
        let status = Arc::new(StatusUseCase::new(
            registries.clone(),
            Arc::new(InMemoryResourceCounter::default()),
            clock.clone(),
        ));
        let hub = PubSubHub::new(registries.pubsub.clone(), status, clock);
        (hub, registries)
    }

    fn next_event(rx: &mut mpsc::UnboundedReceiver<String>) -> EventEnvelope {
        serde_json::from_str(&rx.try_recv().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_subscribe_acknowledges_only_new_subscriber() {
        // テスト項目: 接続時の message イベントは新しい購読者にだけ届く
        // given (前提条件):
        let (hub, _registries) = create_hub();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        hub.subscribe(tx1).await.unwrap();
        next_event(&mut rx1);

        // when (操作):
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let id = hub.subscribe(tx2).await.unwrap();

        // then (期待する結果):
        let welcome = next_event(&mut rx2);
        assert_eq!(welcome.event, events::MESSAGE);
        assert_eq!(welcome.data["data"], PUBSUB_WELCOME);
        assert_eq!(welcome.data["sid"], id.to_string());
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ping_replies_pong_with_data() {
        // テスト項目: ping に対してタイムスタンプ付きの pong が要求者にだけ返る
        // given (前提条件):
        let (hub, _registries) = create_hub();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.subscribe(tx).await.unwrap();
        let (other_tx, mut other_rx) = mpsc::unbounded_channel();
        hub.subscribe(other_tx).await.unwrap();
        next_event(&mut rx);
        next_event(&mut other_rx);

        // when (操作):
        hub.handle_request(id, r#"{"event":"ping","data":{"seq":7}}"#)
            .await
            .unwrap();

        // then (期待する結果):
        let pong = next_event(&mut rx);
        assert_eq!(pong.event, events::PONG);
        assert_eq!(pong.data["data"], json!({"seq": 7}));
        assert_eq!(pong.data["timestamp"], "2024-01-01T00:00:00.000Z");
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_get_status_reports_counts() {
        // テスト項目: get_status に接続数とリソース件数を含む status_response が返る
        // given (前提条件):
        let (hub, _registries) = create_hub();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.subscribe(tx).await.unwrap();
        next_event(&mut rx);

        // when (操作):
        hub.handle_request(id, r#"{"event":"get_status"}"#)
            .await
            .unwrap();

        // then (期待する結果):
        let response = next_event(&mut rx);
        assert_eq!(response.event, events::STATUS_RESPONSE);
        let status: StatusDto = serde_json::from_value(response.data).unwrap();
        assert_eq!(status.connections.pubsub, 1);
        assert_eq!(status.total_connections, 1);
        assert_eq!(status.total_products, SEED_COUNTS.products);
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_requests_reply_error() {
        // テスト項目: 不正な要求や未知のイベントには error が返り、接続は維持される
        // given (前提条件):
        let (hub, registries) = create_hub();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.subscribe(tx).await.unwrap();
        next_event(&mut rx);

        // when (操作):
        hub.handle_request(id, "not json").await.unwrap();
        hub.handle_request(id, r#"{"event":"dance"}"#).await.unwrap();

        // then (期待する結果):
        let malformed = next_event(&mut rx);
        let unknown = next_event(&mut rx);
        assert_eq!(malformed.event, events::ERROR);
        assert_eq!(unknown.event, events::ERROR);
        assert!(unknown.data["message"].as_str().unwrap().contains("dance"));
        assert!(registries.pubsub.contains(id).await);
    }

    #[tokio::test]
    async fn test_publish_sends_named_event_to_all() {
        // テスト項目: publish は kind 名のイベントとして全購読者に配信される
        // given (前提条件):
        let (hub, _registries) = create_hub();
        let mut receivers = Vec::new();
        for _ in 0..2 {
            let (tx, mut rx) = mpsc::unbounded_channel();
            hub.subscribe(tx).await.unwrap();
            next_event(&mut rx);
            receivers.push(rx);
        }
        let message = SensorDataGenerator::new(Duration::from_secs(1))
            .generate(FixedClock::from_millis(0).now())
            .unwrap();

        // when (操作):
        let report = hub.publish(&message).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        for rx in receivers.iter_mut() {
            let event = next_event(rx);
            assert_eq!(event.event, "sensor_data");
            assert_eq!(event.data["type"], "sensor_data");
            assert_eq!(event.data["interval"], "1s");
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_events() {
        // テスト項目: 購読解除後はイベントが届かない
        // given (前提条件):
        let (hub, registries) = create_hub();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.subscribe(tx).await.unwrap();
        next_event(&mut rx);

        // when (操作):
        hub.unsubscribe(id).await;
        hub.publish(&Message::system("x", FixedClock::from_millis(0).now()))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(rx.try_recv().is_err());
        assert!(registries.pubsub.is_empty().await);
    }
}
