//! Domain errors

use thiserror::Error;

use super::value_object::ConnectionId;

/// Errors raised by connection registry operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Same id registered twice. Ids are server-generated, so this is a bug.
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(ConnectionId),
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(ConnectionId),
    #[error("failed to push frame to connection '{0}'")]
    SendFailed(ConnectionId),
}

/// Errors from a single publish iteration
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("payload generation failed: {0}")]
    Generate(String),
    #[error("payload generator '{0}' panicked")]
    GeneratorPanicked(&'static str),
    #[error("broadcast target failed: {0}")]
    Target(String),
    #[error(transparent)]
    Delivery(#[from] RegistryError),
}

/// Misuse of the startup/shutdown sequence
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("startup called more than once")]
    AlreadyStarted,
    #[error("shutdown called before startup")]
    NotRunning,
    #[error("shutdown called more than once")]
    AlreadyShutDown,
}
