//! WebSocket message DTOs

use serde::{Deserialize, Serialize};

/// Prefix of the plain-text fallback echo
pub const RAW_TEXT_PREFIX: &str = "Echo: ";

/// JSON frame sent over the duplex channels, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageDto {
    Welcome {
        message: String,
        timestamp: String,
    },
    Echo {
        received: serde_json::Value,
        timestamp: String,
    },
    Chat {
        client_id: String,
        message: String,
        timestamp: String,
    },
    System {
        message: String,
        timestamp: String,
    },
    SensorData {
        temperature: f64,
        humidity: f64,
        pressure: f64,
        light: f64,
        interval: String,
        timestamp: String,
    },
    SystemStats {
        cpu_usage: f64,
        memory_usage: f64,
        disk_usage: f64,
        network_speed: f64,
        active_connections: u32,
        interval: String,
        timestamp: String,
    },
}

/// Encoded form of a domain message.
///
/// Everything is JSON except the raw-text fallback, which goes out as a
/// plain text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum WireFrame {
    Json(MessageDto),
    Text(String),
}

impl WireFrame {
    /// Render to the text frame sent on a duplex channel
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        match self {
            WireFrame::Json(dto) => serde_json::to_string(dto),
            WireFrame::Text(text) => Ok(text.clone()),
        }
    }

    /// Render to a JSON value, used as the `data` of a pub/sub event
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            WireFrame::Json(dto) => serde_json::to_value(dto),
            WireFrame::Text(text) => Ok(serde_json::Value::String(text.clone())),
        }
    }
}
