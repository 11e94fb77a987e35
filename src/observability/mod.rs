//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → per-RPC spans (TraceLayer in grpc::server)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, text or JSON)
//! ```

pub mod logging;

pub use logging::init_logging;
