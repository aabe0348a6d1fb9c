//! Domain layer
//!
//! Connection/message models and the traits the other layers depend on.
//! Nothing in here knows about axum or the wire framing.

pub mod broadcast;
pub mod entity;
pub mod error;
pub mod resource;
pub mod telemetry;
pub mod value_object;

pub use broadcast::{BroadcastReport, BroadcastTarget};
pub use entity::{Connection, ConnectionState, Message, MessageKind, Payload, PusherChannel};
pub use error::{LifecycleError, PublishError, RegistryError};
pub use resource::{ConnectionCounts, ResourceCounter, ResourceCounts, StatusSnapshot};
pub use telemetry::{
    PayloadGenerator, SensorDataGenerator, SensorReading, SystemStats, SystemStatsGenerator,
};
pub use value_object::ConnectionId;

#[cfg(test)]
pub use broadcast::MockBroadcastTarget;
