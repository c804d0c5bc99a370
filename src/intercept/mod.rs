//! Status interception subsystem.
//!
//! # Data Flow
//! ```text
//! Routed handler produces a response
//!     → exchange.rs (first status is authoritative)
//!         → no override, < 400:  forward unchanged
//!         → no override, >= 400: discard body, send reason phrase
//!         → override registered: discard response, run override handler
//!     → layer.rs applies the status policy and returns one response
//! ```
//!
//! # Design Decisions
//! - Interception is an explicit [`exchange::Outcome`], not an unwind
//! - The original response is dropped whole, so none of its headers or
//!   body bytes reach the client once intercepted
//! - Overrides are registered at startup and shared read-only

pub mod exchange;
pub mod layer;

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;

use crate::handlers::Handler;
use crate::routing::RouteError;

pub use exchange::{Exchange, Outcome};
pub use layer::{Intercept, InterceptLayer};

/// Handlers substituted for responses with a given status.
///
/// Cloning is cheap; clones share the same registrations.
#[derive(Clone, Default)]
pub struct StatusOverrides {
    handlers: Arc<HashMap<StatusCode, Handler>>,
}

impl StatusOverrides {
    /// Register the handler answering in place of `status`.
    pub fn register(&mut self, status: StatusCode, handler: Handler) -> Result<(), RouteError> {
        let handlers = Arc::make_mut(&mut self.handlers);
        if handlers.contains_key(&status) {
            return Err(RouteError::DuplicateOverride(status.as_u16()));
        }
        handlers.insert(status, handler);
        Ok(())
    }

    pub fn get(&self, status: StatusCode) -> Option<&Handler> {
        self.handlers.get(&status)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for StatusOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut statuses: Vec<_> = self.handlers.keys().map(StatusCode::as_u16).collect();
        statuses.sort_unstable();
        f.debug_struct("StatusOverrides").field("statuses", &statuses).finish()
    }
}
