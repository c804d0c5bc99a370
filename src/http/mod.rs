//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, listener bring-up)
//!     → request.rs (request ID, tracing span)
//!     → middleware/ (header injection, gzip)
//!     → routing::StaticMux (interceptor + routing table)
//!     → handlers (file serve, redirect, fixed error)
//!     → response.rs / sniff.rs (shared response helpers)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod sniff;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{HttpServer, RunningServer, ServerError};
