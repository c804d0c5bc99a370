//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or CLI defaults
//!     → loader.rs (parse & deserialize)
//!     → schema.rs (sanitise: fill defaults)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → passed by reference to the routing-table builder and listeners
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ErrorPageConfig, Headers, ListenerConfig, OverridePolicy, Protocol, RedirectConfig,
    ServeConfig, ServerConfig,
};
pub use validation::ValidationError;
