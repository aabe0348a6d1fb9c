//! Request handlers.

pub mod http;
pub mod websocket;

pub use http::{get_status, health_check};
pub use websocket::{chat_handler, echo_handler, pubsub_handler, realtime_handler};
