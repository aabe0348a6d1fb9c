//! UseCase layer
//!
//! Connection protocols (echo, chat, stream, pub/sub), the periodic
//! publishers and the lifecycle controller that owns them.

pub mod chat_room;
pub mod echo;
pub mod lifecycle;
pub mod publisher;
pub mod pubsub;
pub mod status;
pub mod stream;

pub use chat_room::ChatRoom;
pub use echo::EchoUseCase;
pub use lifecycle::{LifecycleController, LifecycleState, ShutdownReport};
pub use publisher::{FAST_INTERVAL, PublisherTask, SLOW_INTERVAL};
pub use pubsub::PubSubHub;
pub use status::{EndpointRegistries, StatusUseCase};
pub use stream::StreamUseCase;
