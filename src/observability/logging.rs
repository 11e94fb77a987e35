//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber once at startup
//! - Pick the filter: `RUST_LOG` if set, else the configured level
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Build the filter for `config`, letting `RUST_LOG` win when present.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global subscriber.
///
/// Must be called at most once per process.
pub fn init_logging(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
