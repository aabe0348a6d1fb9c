//! Broadcast target trait
//!
//! Publishers only know this seam. The WebSocket stream registry and the
//! pub/sub hub both implement it, each with its own wire framing.

use async_trait::async_trait;

use super::{entity::Message, error::PublishError};

/// Outcome of one best-effort fan-out.
///
/// Partial failure shows up as `failed > 0`; it is never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections a send was attempted on
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl BroadcastReport {
    /// Combine the reports of several targets
    pub fn merge(self, other: BroadcastReport) -> BroadcastReport {
        BroadcastReport {
            attempted: self.attempted + other.attempted,
            delivered: self.delivered + other.delivered,
            failed: self.failed + other.failed,
        }
    }
}

/// Something a publisher can hand a message to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BroadcastTarget: Send + Sync {
    /// Deliver `message` to every current subscriber of this target.
    ///
    /// Returns `Err` only when the message itself could not be framed;
    /// per-subscriber send failures are counted in the report.
    async fn publish(&self, message: &Message) -> Result<BroadcastReport, PublishError>;
}
