//! UseCase: telemetry stream subscribers
//!
//! Subscribers only receive; the two publishers push into this registry.

use std::sync::Arc;

use kairo_shared::time::Clock;

use crate::{
    domain::{Connection, ConnectionId, Message, PusherChannel, RegistryError},
    infrastructure::ConnectionRegistry,
};

pub const STREAM_WELCOME: &str = "Real-time data stream started";

pub struct StreamUseCase {
    registry: Arc<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl StreamUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Register a subscriber; it receives the welcome before any series tick
    pub async fn subscribe(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError> {
        let id = ConnectionId::generate();
        let now = self.clock.now();
        self.registry
            .register_greeted(
                Connection::new(id, sender, now),
                &Message::welcome(STREAM_WELCOME, now),
            )
            .await?;
        tracing::info!("Stream subscriber '{}' connected", id);
        Ok(id)
    }

    pub async fn unsubscribe(&self, id: ConnectionId) {
        if self.registry.deregister(id).await.is_some() {
            tracing::info!("Stream subscriber '{}' disconnected", id);
        }
    }
}
