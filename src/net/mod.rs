//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig (host, port)
//!     → listener.rs (resolve, bind)
//!     → Listener handed to the gRPC serve loop
//! ```
//!
//! # Design Decisions
//! - Exactly one listener per process
//! - Bind failure is fatal, never retried
//! - Accepting and per-connection concurrency belong to the gRPC server

pub mod listener;

pub use listener::{Listener, ListenerError};
