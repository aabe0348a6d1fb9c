//! Infrastructure layer
//!
//! Wire formats, the connection registry and collaborator implementations.

pub mod dto;
pub mod registry;
pub mod resource;

pub use registry::ConnectionRegistry;
pub use resource::InMemoryResourceCounter;
