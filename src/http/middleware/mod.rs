//! Response middleware: `Handler -> Handler` transformations.
//!
//! Listener-scope order, outermost first:
//! ```text
//! header injection → gzip → routed handler (interceptor inside)
//! ```
//! Per-serve header injection sits directly around the serve's terminal
//! handler, so it always sees the response before listener headers do.

pub mod compression;
pub mod headers;

pub use compression::{Gzip, GzipLayer};
pub use headers::{inject, HeaderSet, InvalidHeader};
