//! Server configuration

use std::time::Duration;

use crate::usecase::{FAST_INTERVAL, SLOW_INTERVAL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address to bind to (e.g., "127.0.0.1")
    pub host: String,
    /// Port number to bind to; 0 picks a free port
    pub port: u16,
    /// Cadence of the `system_stats` series
    pub fast_interval: Duration,
    /// Cadence of the `sensor_data` series
    pub slow_interval: Duration,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            fast_interval: FAST_INTERVAL,
            slow_interval: SLOW_INTERVAL,
        }
    }
}
