//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build routing table → Load TLS → Bind all listeners
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_termination() resolves
//!
//! Shutdown (shutdown.rs):
//!     Shutdown::trigger() → every listener stops accepting → drain (grace) → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: a config, build or TLS error is fatal before any socket is bound.
//!   A bind failure drops the sockets already bound before returning
//! - Listeners start last (traffic only when ready)

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_termination;
