//! Request identification and tracing.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID) for requests that lack one
//! - Echo the ID back in the response
//! - Open one tracing span per request carrying the ID
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept as is

use axum::http::Request;
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Access to the request ID of a request.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers().get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}

/// Span opened for every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = request.request_id().unwrap_or("-"),
        )
    }
}

/// Wrap a router with request IDs and request tracing.
pub fn instrument(router: Router) -> Router {
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use tower::ServiceExt;

    #[tokio::test]
    async fn generates_and_propagates_id() {
        let router = instrument(Router::new().fallback(|| async { "ok" }));
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response.headers()[X_REQUEST_ID].to_str().unwrap();
        assert_eq!(id.len(), 36);
    }

    #[tokio::test]
    async fn keeps_client_id() {
        let router = instrument(Router::new().fallback(|| async { "ok" }));
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(X_REQUEST_ID, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
    }

    #[test]
    fn reads_request_id() {
        let request = Request::builder().header(X_REQUEST_ID, "id-1").body(()).unwrap();
        assert_eq!(request.request_id(), Some("id-1"));
    }
}
