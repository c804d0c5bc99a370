//! Tower layer enforcing a single source of truth for the response status.

use std::convert::Infallible;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::{Layer, Service, ServiceExt};

use crate::config::OverridePolicy;
use crate::http::response;
use crate::intercept::exchange::{Exchange, Outcome};
use crate::intercept::StatusOverrides;

/// Wraps a handler with status interception.
#[derive(Debug, Clone)]
pub struct InterceptLayer {
    overrides: StatusOverrides,
    policy: OverridePolicy,
}

impl InterceptLayer {
    pub fn new(overrides: StatusOverrides, policy: OverridePolicy) -> Self {
        Self { overrides, policy }
    }
}

impl<S> Layer<S> for InterceptLayer {
    type Service = Intercept<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Intercept {
            inner,
            overrides: self.overrides.clone(),
            policy: self.policy,
        }
    }
}

/// Service produced by [`InterceptLayer`].
#[derive(Debug, Clone)]
pub struct Intercept<S> {
    inner: S,
    overrides: StatusOverrides,
    policy: OverridePolicy,
}

impl<S> Service<Request<Body>> for Intercept<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // The override handler sees the request as it reached the interceptor.
        let replay = replay_of(&request);
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let overrides = self.overrides.clone();
        let policy = self.policy;

        Box::pin(async move {
            let mut exchange = Exchange::new();
            let original = inner.oneshot(request).await?;
            let status = original.status();

            match exchange.set_status(status, &overrides) {
                Outcome::Passthrough | Outcome::AlreadySent => Ok(original),
                Outcome::ReasonPhrase => {
                    drop(original);
                    tracing::debug!(status = status.as_u16(), "No override registered, sending reason phrase");
                    Ok(response::status_text(status))
                }
                Outcome::Intercepted(handler) => {
                    drop(original);
                    tracing::debug!(status = status.as_u16(), policy = ?policy, "Status intercepted by override handler");
                    let mut substitute = handler.oneshot(replay).await?;
                    if policy == OverridePolicy::PreserveStatus {
                        *substitute.status_mut() = status;
                    }
                    Ok(substitute)
                }
            }
        })
    }
}

fn replay_of(request: &Request<Body>) -> Request<Body> {
    let mut replay = Request::new(Body::empty());
    *replay.method_mut() = request.method().clone();
    *replay.uri_mut() = request.uri().clone();
    *replay.version_mut() = request.version();
    *replay.headers_mut() = request.headers().clone();
    replay
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{boxed, Handler};
    use axum::http::{header, HeaderValue, StatusCode};
    use tower::service_fn;

    fn responding(status: StatusCode, body: &'static str) -> Handler {
        boxed(service_fn(move |_req: Request<Body>| async move {
            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
            response
                .headers_mut()
                .insert("x-stale", HeaderValue::from_static("original"));
            Ok::<_, Infallible>(response)
        }))
    }

    fn overrides_for(status: StatusCode, handler: Handler) -> StatusOverrides {
        let mut overrides = StatusOverrides::default();
        overrides.register(status, handler).unwrap();
        overrides
    }

    async fn call(
        inner: Handler,
        overrides: StatusOverrides,
        policy: OverridePolicy,
    ) -> (StatusCode, axum::http::HeaderMap, String) {
        let service = InterceptLayer::new(overrides, policy).layer(inner);
        let response = service
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn override_body_replaces_original() {
        let overrides = overrides_for(StatusCode::NOT_FOUND, responding(StatusCode::OK, "custom page"));
        let (status, _, body) = call(
            responding(StatusCode::NOT_FOUND, "partial original output"),
            overrides,
            OverridePolicy::PreserveStatus,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "custom page");
        assert!(!body.contains("partial original"));
    }

    #[tokio::test]
    async fn stale_headers_do_not_leak() {
        let page = boxed(service_fn(|_req: Request<Body>| async {
            Ok::<_, Infallible>(Response::new(Body::from("page")))
        }));
        let overrides = overrides_for(StatusCode::NOT_FOUND, page);
        let (_, headers, _) = call(
            responding(StatusCode::NOT_FOUND, "original"),
            overrides,
            OverridePolicy::PreserveStatus,
        )
        .await;

        assert!(headers.get("x-stale").is_none());
        assert!(headers.get(header::CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn handler_policy_keeps_override_status() {
        let overrides = overrides_for(StatusCode::NOT_FOUND, responding(StatusCode::OK, "custom page"));
        let (status, _, body) = call(
            responding(StatusCode::NOT_FOUND, "original"),
            overrides,
            OverridePolicy::HandlerStatus,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "custom page");
    }

    #[tokio::test]
    async fn override_sees_original_request() {
        let echo = boxed(service_fn(|req: Request<Body>| async move {
            Ok::<_, Infallible>(Response::new(Body::from(req.uri().path().to_string())))
        }));
        let overrides = overrides_for(StatusCode::NOT_FOUND, echo);
        let (_, _, body) = call(
            responding(StatusCode::NOT_FOUND, "original"),
            overrides,
            OverridePolicy::PreserveStatus,
        )
        .await;

        assert_eq!(body, "/missing");
    }

    #[tokio::test]
    async fn unregistered_errors_get_reason_phrase() {
        let overrides = overrides_for(StatusCode::NOT_FOUND, responding(StatusCode::OK, "page"));
        for code in 400..=599u16 {
            let status = StatusCode::from_u16(code).unwrap();
            if status == StatusCode::NOT_FOUND {
                continue;
            }
            let (got, headers, body) = call(
                responding(status, "handler output"),
                overrides.clone(),
                OverridePolicy::PreserveStatus,
            )
            .await;

            assert_eq!(got, status);
            assert_eq!(body, response::reason_phrase(status));
            assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        }
    }

    #[tokio::test]
    async fn success_and_redirects_pass_through() {
        for status in [StatusCode::OK, StatusCode::MOVED_PERMANENTLY, StatusCode::NOT_MODIFIED] {
            let (got, headers, body) = call(
                responding(status, "untouched"),
                StatusOverrides::default(),
                OverridePolicy::PreserveStatus,
            )
            .await;

            assert_eq!(got, status);
            assert_eq!(body, "untouched");
            assert_eq!(headers["x-stale"], "original");
        }
    }
}
