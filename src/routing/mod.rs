//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (clean path, longest-prefix lookup)
//!     → matcher.rs (evaluate exact/subtree patterns)
//!     → Return: route handler, redirect, 404, or 400 for `*`
//!
//! Route Compilation (at startup):
//!     ServeConfig[] + RedirectConfig[] + ErrorPageConfig[]
//!     → register prefixes (duplicates rejected)
//!     → register status overrides (duplicates rejected)
//!     → Freeze as immutable RoutingTable shared by every listener
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Longest registered prefix wins

pub mod matcher;
pub mod router;

use thiserror::Error;

use crate::http::middleware::InvalidHeader;

pub use matcher::{clean_path, Pattern};
pub use router::{Route, RoutingTable, StaticMux};

/// Registration-time routing errors. All of them are configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route `{0}` registered more than once")]
    DuplicateRoute(String),
    #[error("handler for status {0} registered more than once")]
    DuplicateOverride(u16),
    #[error("route `{0}` must start with `/`")]
    InvalidPattern(String),
}

/// Failure turning a configuration into handlers.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Header(#[from] InvalidHeader),
    #[error("invalid status code {0}")]
    InvalidStatus(u16),
    #[error("serve `{0}` has neither a target nor an error status")]
    MissingTarget(String),
}
