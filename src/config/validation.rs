//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (grace period > 0, optional limits > 0)
//! - Check the log filter parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - The port is not range-checked here; bad ports fail at bind time
//! - Runs before config is accepted into the system

use tracing_subscriber::EnvFilter;

use crate::config::schema::ManagementConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &ManagementConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError {
            field: "listener.host",
            message: "must not be empty".to_string(),
        });
    }

    if config.shutdown.grace_period_secs == 0 {
        errors.push(ValidationError {
            field: "shutdown.grace_period_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.server.request_timeout_secs == Some(0) {
        errors.push(ValidationError {
            field: "server.request_timeout_secs",
            message: "must be greater than zero when set".to_string(),
        });
    }

    if config.server.concurrency_limit_per_connection == Some(0) {
        errors.push(ValidationError {
            field: "server.concurrency_limit_per_connection",
            message: "must be greater than zero when set".to_string(),
        });
    }

    if let Err(e) = EnvFilter::try_new(&config.observability.log_level) {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: e.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
