//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → http::request (one span per request with its request ID)
//!
//! Consumers:
//!     → stdout
//! ```

pub mod logging;
