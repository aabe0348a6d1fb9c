//! Logging setup utilities for the Kairo real-time server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the library crate named by `crate_name` and the binary.
/// `RUST_LOG` takes precedence when it is set.
///
/// # Arguments
///
/// * `crate_name` - The library crate to enable (e.g., "kairo-server")
/// * `binary_name` - The name of the binary (e.g., "kairo-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use kairo_shared::logger::setup_logger;
///
/// setup_logger("kairo-server", "kairo-server", "debug");
/// ```
pub fn setup_logger(crate_name: &str, binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(crate_name, binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the fallback filter directives used when `RUST_LOG` is absent.
fn default_directives(crate_name: &str, binary_name: &str, level: &str) -> String {
    let crate_target = crate_name.replace('-', "_");
    let binary_target = binary_name.replace('-', "_");
    if crate_target == binary_target {
        format!("{}={},tower_http={}", crate_target, level, level)
    } else {
        format!(
            "{}={},{}={},tower_http={}",
            crate_target, level, binary_target, level, level
        )
    }
}
