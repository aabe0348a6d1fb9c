//! Conversion logic between domain entities and DTOs.

use std::time::Duration;

use kairo_shared::time::to_rfc3339;

use crate::domain::{Message, Payload, StatusSnapshot};
use crate::infrastructure::dto::{
    http::{ConnectionCountsDto, StatusDto},
    websocket::{MessageDto, RAW_TEXT_PREFIX, WireFrame},
};

/// Render a publish cadence the way clients display it ("0.5s", "1s")
pub fn format_interval(interval: Duration) -> String {
    format!("{}s", interval.as_secs_f64())
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Message> for WireFrame {
    fn from(message: &Message) -> Self {
        let timestamp = to_rfc3339(message.timestamp());
        let dto = match message.payload() {
            Payload::RawText(text) => return WireFrame::Text(format!("{RAW_TEXT_PREFIX}{text}")),
            Payload::Welcome { message } => MessageDto::Welcome {
                message: message.clone(),
                timestamp,
            },
            Payload::Echo { received } => MessageDto::Echo {
                received: received.clone(),
                timestamp,
            },
            Payload::Chat { from, message } => MessageDto::Chat {
                client_id: from.to_string(),
                message: message.clone(),
                timestamp,
            },
            Payload::System { message } => MessageDto::System {
                message: message.clone(),
                timestamp,
            },
            Payload::SensorData(reading) => MessageDto::SensorData {
                temperature: reading.temperature,
                humidity: reading.humidity,
                pressure: reading.pressure,
                light: reading.light,
                interval: format_interval(reading.interval),
                timestamp,
            },
            Payload::SystemStats(stats) => MessageDto::SystemStats {
                cpu_usage: stats.cpu_usage,
                memory_usage: stats.memory_usage,
                disk_usage: stats.disk_usage,
                network_speed: stats.network_speed,
                active_connections: stats.active_connections,
                interval: format_interval(stats.interval),
                timestamp,
            },
        };
        WireFrame::Json(dto)
    }
}

impl From<&StatusSnapshot> for StatusDto {
    fn from(snapshot: &StatusSnapshot) -> Self {
        Self {
            server_time: to_rfc3339(snapshot.server_time),
            total_connections: snapshot.connections.total(),
            connections: ConnectionCountsDto {
                echo: snapshot.connections.echo,
                chat: snapshot.connections.chat,
                realtime: snapshot.connections.realtime,
                pubsub: snapshot.connections.pubsub,
            },
            total_users: snapshot.resources.users,
            total_products: snapshot.resources.products,
            total_orders: snapshot.resources.orders,
            total_posts: snapshot.resources.posts,
        }
    }
}
