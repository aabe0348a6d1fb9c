//! UseCase: status snapshot

use std::sync::Arc;

use kairo_shared::time::Clock;

use crate::{
    domain::{ConnectionCounts, ResourceCounter, StatusSnapshot},
    infrastructure::ConnectionRegistry,
};

/// The per-endpoint connection registries
#[derive(Clone)]
pub struct EndpointRegistries {
    pub echo: Arc<ConnectionRegistry>,
    pub chat: Arc<ConnectionRegistry>,
    pub realtime: Arc<ConnectionRegistry>,
    pub pubsub: Arc<ConnectionRegistry>,
}

impl EndpointRegistries {
    pub fn new() -> Self {
        Self {
            echo: Arc::new(ConnectionRegistry::new("echo")),
            chat: Arc::new(ConnectionRegistry::new("chat")),
            realtime: Arc::new(ConnectionRegistry::new("realtime")),
            pubsub: Arc::new(ConnectionRegistry::new("pubsub")),
        }
    }

    pub async fn counts(&self) -> ConnectionCounts {
        ConnectionCounts {
            echo: self.echo.len().await,
            chat: self.chat.len().await,
            realtime: self.realtime.len().await,
            pubsub: self.pubsub.len().await,
        }
    }
}

impl Default for EndpointRegistries {
    fn default() -> Self {
        Self::new()
    }
}

/// ステータス取得のユースケース
pub struct StatusUseCase {
    registries: EndpointRegistries,
    resources: Arc<dyn ResourceCounter>,
    clock: Arc<dyn Clock>,
}

impl StatusUseCase {
    pub fn new(
        registries: EndpointRegistries,
        resources: Arc<dyn ResourceCounter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registries,
            resources,
            clock,
        }
    }

    pub async fn execute(&self) -> StatusSnapshot {
        StatusSnapshot {
            server_time: self.clock.now(),
            connections: self.registries.counts().await,
            resources: self.resources.counts().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, ConnectionId},
        infrastructure::{InMemoryResourceCounter, resource::inmemory::SEED_COUNTS},
    };
    use kairo_shared::time::FixedClock;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_snapshot_counts_connections_and_resources() {
        // テスト項目: スナップショットにエンドポイント別の接続数とリソース件数が含まれる
        // given (前提条件):
        let registries = EndpointRegistries::new();
        let clock = FixedClock::from_millis(1_704_067_200_000);
        let usecase = StatusUseCase::new(
            registries.clone(),
            Arc::new(InMemoryResourceCounter::default()),
            Arc::new(clock),
        );
        let mut receivers = Vec::new();
        for registry in [&registries.chat, &registries.chat, &registries.pubsub] {
            let (tx, rx) = mpsc::unbounded_channel();
            registry
                .register(Connection::new(ConnectionId::generate(), tx, clock.now()))
                .await
                .unwrap();
            receivers.push(rx);
        }

        // when (操作):
        let snapshot = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(
            snapshot.connections,
            ConnectionCounts {
                echo: 0,
                chat: 2,
                realtime: 0,
                pubsub: 1,
            }
        );
        assert_eq!(snapshot.connections.total(), 3);
        assert_eq!(snapshot.resources, SEED_COUNTS);
        assert_eq!(snapshot.server_time, clock.now());
    }
}
