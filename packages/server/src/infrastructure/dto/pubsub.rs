//! Publish/subscribe event DTOs
//!
//! Every frame in either direction is `{"event": <name>, "data": <value>}`.

use serde::{Deserialize, Serialize};

/// Event names
pub mod events {
    /// Welcome acknowledgment sent to a new subscriber
    pub const MESSAGE: &str = "message";
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
    pub const GET_STATUS: &str = "get_status";
    pub const STATUS_RESPONSE: &str = "status_response";
    pub const ERROR: &str = "error";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl EventEnvelope {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeData {
    pub data: String,
    /// Subscriber id
    pub sid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongData {
    pub timestamp: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    pub message: String,
}
