//! Logging utilities
//!
//! Simple logging initialization that:
//! - Respects RUST_LOG environment variable
//! - Falls back to a filter from config, then to "info"
//! - Respects NO_COLOR
//!
//! # Usage
//!
//! ```rust
//! use evented_loader::utils::init_logging;
//!
//! init_logging(None).ok(); // Uses RUST_LOG or defaults to "info"
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Build the env filter: RUST_LOG, then `filter`, then "info"
fn env_filter(filter: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(filter.unwrap_or("info"))
}

/// Initialize human-readable logging to stderr
///
/// Fails if a global subscriber is already installed.
///
/// # Arguments
/// * `filter` - Optional log filter from config (e.g., "debug", "evented_loader=trace").
///   RUST_LOG still takes precedence.
pub fn init_logging(filter: Option<&str>) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(env_filter(filter))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Initialize logging with JSON output (for log aggregation)
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(env_filter(filter))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Initialize logging from [`LoggingConfig`]
///
/// `json_format` falls back to human-readable output when the
/// `json-logging` feature is disabled.
pub fn init_logging_from_config(config: Option<&LoggingConfig>) -> anyhow::Result<()> {
    let filter = config.and_then(|c| c.filter.as_deref());

    if config.map(|c| c.json_format).unwrap_or(false) {
        #[cfg(feature = "json-logging")]
        {
            return init_json_logging(filter);
        }
    }
    init_logging(filter)
}
