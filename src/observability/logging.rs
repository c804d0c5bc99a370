//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the filter given on the command line

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor `--log-level` is given.
pub const DEFAULT_FILTER: &str = "filegate=info,tower_http=info";

/// Install the global subscriber.
pub fn init(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
