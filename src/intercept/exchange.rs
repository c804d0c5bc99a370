//! Per-request interception state.
//!
//! An [`Exchange`] is created when a request enters the interceptor and
//! dropped with its response. It is owned by the task serving that one
//! request and never shared.

use axum::http::StatusCode;

use crate::handlers::Handler;
use crate::intercept::StatusOverrides;

/// Decision taken by the first status set on an exchange.
#[derive(Clone)]
pub enum Outcome {
    /// The status reaches the client unchanged, with the original body.
    Passthrough,
    /// The original response is discarded and the override handler answers.
    Intercepted(Handler),
    /// The original response is discarded and the reason phrase is sent.
    ReasonPhrase,
    /// A status was already sent for this exchange; nothing changes.
    AlreadySent,
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Passthrough => f.write_str("Passthrough"),
            Outcome::Intercepted(_) => f.write_str("Intercepted"),
            Outcome::ReasonPhrase => f.write_str("ReasonPhrase"),
            Outcome::AlreadySent => f.write_str("AlreadySent"),
        }
    }
}

/// In-flight state of a single request.
///
/// `header_sent` goes from false to true exactly once; after that no status
/// may be set or overridden.
#[derive(Debug, Default)]
pub struct Exchange {
    status: Option<StatusCode>,
    header_sent: bool,
    intercepted: bool,
}

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit the status of the response. Only the first call decides.
    pub fn set_status(&mut self, status: StatusCode, overrides: &StatusOverrides) -> Outcome {
        if self.header_sent {
            return Outcome::AlreadySent;
        }
        self.header_sent = true;
        self.status = Some(status);

        if let Some(handler) = overrides.get(status) {
            self.intercepted = true;
            Outcome::Intercepted(handler.clone())
        } else if status.as_u16() >= 400 {
            self.intercepted = true;
            Outcome::ReasonPhrase
        } else {
            Outcome::Passthrough
        }
    }

    /// The committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn header_sent(&self) -> bool {
        self.header_sent
    }

    pub fn intercepted(&self) -> bool {
        self.intercepted
    }
}
