//! CRUD collaborator seam
//!
//! The resource endpoints themselves live outside this crate. The status
//! snapshot only needs their entity counts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Entity counts reported by the CRUD collaborators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub users: usize,
    pub products: usize,
    pub orders: usize,
    pub posts: usize,
}

#[async_trait]
pub trait ResourceCounter: Send + Sync {
    async fn counts(&self) -> ResourceCounts;
}

/// Live connection counts per endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionCounts {
    pub echo: usize,
    pub chat: usize,
    pub realtime: usize,
    pub pubsub: usize,
}

impl ConnectionCounts {
    pub fn total(&self) -> usize {
        self.echo + self.chat + self.realtime + self.pubsub
    }
}

/// Point-in-time view of tracked entities
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub server_time: DateTime<Utc>,
    pub connections: ConnectionCounts,
    pub resources: ResourceCounts,
}
