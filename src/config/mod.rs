//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CLI overrides (--port)
//!     → ManagementConfig (immutable, passed to Bootstrap)
//! ```
//!
//! # Design Decisions
//! - Config is an explicit value handed to the bootstrap, never a global
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ListenerConfig;
pub use schema::ManagementConfig;
pub use schema::ObservabilityConfig;
pub use schema::ServerOptions;
pub use schema::ShutdownConfig;
pub use schema::DEFAULT_PORT;
