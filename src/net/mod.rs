//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig (protocol = https)
//!     → tls.rs (check cert/key exist, load rustls config)
//!     → http::server binds the TCP listener and serves TLS over it
//! ```
//!
//! # Design Decisions
//! - Plaintext and TLS listeners share the same handler stack
//! - Certificates are loaded once at startup; a bad pair is fatal

pub mod tls;
