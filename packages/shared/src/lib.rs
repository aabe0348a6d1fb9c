//! Shared utilities for Kairo packages.

pub mod logger;
pub mod time;
