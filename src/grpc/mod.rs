//! gRPC subsystem.
//!
//! # Data Flow
//! ```text
//! ServerInstance::new(options)
//!     → register(ManagementServer)      (server.rs, service.rs)
//!     → serve(listener, stop)           (accept + dispatch until stop)
//! ```
//!
//! The wire schema lives in `proto/management.proto` and is compiled by
//! `build.rs` into [`proto`].

pub mod calls;
pub mod server;
pub mod service;

pub mod proto {
    //! Generated protobuf types, server and client for `management`.
    tonic::include_proto!("management");
}

pub use calls::{CallGuard, CallTracker};
pub use server::{RegistrationError, ServeError, ServerInstance};
pub use service::ManagementServer;
