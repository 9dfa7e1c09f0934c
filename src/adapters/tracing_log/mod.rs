// Tracing log adapter - Structured logging using tracing crate

use tracing_subscriber::EnvFilter;

use crate::adapters::toml_config::LogSettings;
use crate::domain::errors::*;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging(settings: &LogSettings) -> Result<(), DomainError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(settings.level.to_lowercase())
            .map_err(|e| DomainError::Config(format!("Invalid log level '{}': {}", settings.level, e)))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(())
}
