//! HTTP API response DTOs

use serde::{Deserialize, Serialize};

/// Live connection counts per endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionCountsDto {
    pub echo: usize,
    pub chat: usize,
    pub realtime: usize,
    pub pubsub: usize,
}

/// Status snapshot, shared by `GET /api/status` and the pub/sub `status_response` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDto {
    pub server_time: String,
    pub total_connections: usize,
    pub connections: ConnectionCountsDto,
    pub total_users: usize,
    pub total_products: usize,
    pub total_orders: usize,
    pub total_posts: usize,
}
