// Tracing subscriber setup

use crate::config::Config;
use crate::core::errors::IdentityError;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber based on configuration
///
/// `RUST_LOG` takes precedence over `LOG_LEVEL`.
pub fn init_tracing(config: &Config) -> Result<(), IdentityError> {
    let level = parse_log_level(&config.log_level)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    let installed = if config.log_format == "json" {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    installed.map_err(|e| {
        IdentityError::Configuration(format!("Failed to install tracing subscriber: {}", e))
    })
}

/// Parse log level string to tracing Level
pub fn parse_log_level(level: &str) -> Result<tracing::Level, IdentityError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(IdentityError::Configuration(format!("Invalid log level: {}", level))),
    }
}
