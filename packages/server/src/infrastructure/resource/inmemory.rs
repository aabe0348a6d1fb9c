//! InMemory ResourceCounter 実装
//!
//! CRUD エンドポイント本体はこのクレートの外にあるため、件数だけを
//! インメモリで保持します。

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ResourceCounter, ResourceCounts};

/// Counts of the seed data set the demo CRUD service starts with
pub const SEED_COUNTS: ResourceCounts = ResourceCounts {
    users: 1,
    products: 3,
    orders: 1,
    posts: 1,
};

/// インメモリ ResourceCounter 実装
pub struct InMemoryResourceCounter {
    counts: RwLock<ResourceCounts>,
}

impl InMemoryResourceCounter {
    pub fn new(counts: ResourceCounts) -> Self {
        Self {
            counts: RwLock::new(counts),
        }
    }

    /// Replace the reported counts (collaborators call this after a write)
    pub async fn update(&self, counts: ResourceCounts) {
        *self.counts.write().await = counts;
    }
}

impl Default for InMemoryResourceCounter {
    fn default() -> Self {
        Self::new(SEED_COUNTS)
    }
}

#[async_trait]
impl ResourceCounter for InMemoryResourceCounter {
    async fn counts(&self) -> ResourceCounts {
        *self.counts.read().await
    }
}
