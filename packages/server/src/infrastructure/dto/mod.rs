//! Data Transfer Objects (DTOs) for the real-time server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: duplex channel message frames
//! - `pubsub`: publish/subscribe event envelopes
//! - `http`: HTTP API response bodies

pub mod conversion;
pub mod http;
pub mod pubsub;
pub mod websocket;
