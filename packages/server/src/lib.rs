//! Real-time broadcast server library.
//!
//! Echo, chat, telemetry stream and pub/sub endpoints over WebSocket, backed
//! by per-endpoint connection registries and two periodic publishers whose
//! lifetime is owned by a lifecycle controller.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
