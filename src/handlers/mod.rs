//! Terminal handlers: the leaves that actually produce response content.
//!
//! # Responsibilities
//! - File serving from a content source (file_server.rs, source.rs)
//! - Directory listing pages (listing.rs)
//! - Fixed redirects (redirect.rs)
//! - Fixed error statuses and file-backed error pages (fixed.rs)
//!
//! # Design Decisions
//! - Every handler is a cloneable `Send + Sync` tower service that never
//!   fails: I/O problems are turned into HTTP statuses where they occur
//! - Error bodies written here are only the reason phrase; the interceptor
//!   has the final say over what the client sees for error statuses

pub mod file_server;
pub mod fixed;
pub mod listing;
pub mod redirect;
pub mod source;

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use tower::util::BoxCloneSyncService;
use tower::{service_fn, Service};

pub use file_server::FileServer;
pub use fixed::{ErrorPage, FixedError};
pub use redirect::Redirect;
pub use source::{ContentSource, Dir, ListingGuard, OpenError};

/// A composable request handler.
pub type Handler = BoxCloneSyncService<Request<Body>, Response, Infallible>;

/// Erase the type of a handler service.
pub fn boxed<S>(service: S) -> Handler
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    BoxCloneSyncService::new(service)
}

/// A leaf handler producing a whole response for a request.
pub trait Terminal: Send + Sync + 'static {
    fn serve(&self, request: Request<Body>) -> impl Future<Output = Response> + Send;
}

/// Lift a terminal handler into a [`Handler`].
pub fn terminal<T: Terminal>(handler: T) -> Handler {
    let handler = Arc::new(handler);
    boxed(service_fn(move |request: Request<Body>| {
        let handler = Arc::clone(&handler);
        async move { Ok::<_, Infallible>(handler.serve(request).await) }
    }))
}
