//! Real-time broadcast server.
//!
//! Serves echo, chat, telemetry stream and pub/sub endpoints over WebSocket,
//! plus health and status endpoints over HTTP.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kairo-server
//! cargo run --bin kairo-server -- --host 0.0.0.0 --port 3000 --fast-interval-ms 250
//! ```

use std::time::Duration;

use clap::Parser;
use kairo_server::{config::ServerConfig, ui::Server};
use kairo_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kairo-server")]
#[command(about = "Real-time WebSocket server with periodic telemetry broadcast", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Interval of the system_stats series in milliseconds
    #[arg(long, default_value = "500", value_parser = clap::value_parser!(u64).range(1..))]
    fast_interval_ms: u64,

    /// Interval of the sensor_data series in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    slow_interval_ms: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            fast_interval: Duration::from_millis(args.fast_interval_ms),
            slow_interval: Duration::from_millis(args.slow_interval_ms),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger("kairo-server", env!("CARGO_BIN_NAME"), &args.log_level);

    let config = ServerConfig::from(args);
    tracing::info!(
        "Publishing system_stats every {:?} and sensor_data every {:?}",
        config.fast_interval,
        config.slow_interval
    );

    let server = Server::from_config(&config);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
