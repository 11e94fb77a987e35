//! Management Server Library
//!
//! Bootstrap and lifecycle for the management gRPC service: listener
//! acquisition, service registration, the serve loop and signal-driven
//! shutdown.

pub mod config;
pub mod grpc;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ManagementConfig;
pub use grpc::{ManagementServer, ServerInstance};
pub use lifecycle::{Bootstrap, LifecycleError, RunningService, Shutdown};
