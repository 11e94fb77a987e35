//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the management server.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Port the management server listens on when nothing else is configured.
pub const DEFAULT_PORT: i64 = 33073;

/// Root configuration for the management server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ManagementConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// gRPC server options.
    pub server: ServerOptions,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0" for all interfaces).
    pub host: String,

    /// TCP port. Kept wide so out-of-range values reach the bind step and fail there.
    pub port: i64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Options applied to the gRPC server before any service is registered.
///
/// Everything is off by default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerOptions {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,

    /// Maximum concurrent requests per connection.
    pub concurrency_limit_per_connection: Option<usize>,
}

impl ServerOptions {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time allowed for in-flight calls to finish once shutdown starts.
    pub grace_period_secs: u64,
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
