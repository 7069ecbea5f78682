//! Tracing subscriber setup.

use crate::LoggingConfig;
use mediastash_error::{ConfigError, MediaStashResult};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stdout as
/// plain text, or as JSON lines when `json` is enabled.
///
/// # Errors
///
/// Returns error if the level filter is invalid or a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> MediaStashResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level()))
        .map_err(|e| {
            ConfigError::new(format!("Invalid log level {:?}: {}", config.level(), e))
        })?;

    let fmt_layer = if *config.json() {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::debug!(level = %config.level(), json = *config.json(), "Tracing initialized");
    Ok(())
}
