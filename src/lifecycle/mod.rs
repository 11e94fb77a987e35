//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → Register service → Install signal handlers
//!     → Spawn serve loop → Armed
//!
//! Shutdown (shutdown.rs):
//!     Armed → ShuttingDown (first signal) → Terminated
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//!     second SIGTERM/SIGINT while draining → forced shutdown
//! ```
//!
//! # Design Decisions
//! - Every step returns a `Result`; only `main` logs and exits
//! - Shutdown has timeout: forced exit after the grace period

pub mod shutdown;
pub mod signals;
pub mod startup;

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::grpc::{RegistrationError, ServeError};
use crate::net::ListenerError;

pub use shutdown::{Shutdown, ShutdownPhase};
pub use signals::{ShutdownSignals, Signal};
pub use startup::{Bootstrap, RunningService};

/// Exit status used when a second signal cuts shutdown short.
pub const FORCED_EXIT_CODE: u8 = 130;

/// Errors that end the process.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The listener could not be bound.
    #[error(transparent)]
    Bind(#[from] ListenerError),

    /// Signal handlers could not be installed.
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),

    /// The service could not be registered.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The serve loop ended abnormally.
    #[error(transparent)]
    Serve(#[from] ServeError),

    /// In-flight calls did not finish in time.
    #[error("shutdown did not finish within the {}s grace period", .0.as_secs())]
    ShutdownTimeout(Duration),

    /// A second signal arrived while draining.
    #[error("shutdown forced by a second signal")]
    ForcedShutdown,
}

impl LifecycleError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            LifecycleError::ForcedShutdown => FORCED_EXIT_CODE,
            _ => 1,
        }
    }
}
