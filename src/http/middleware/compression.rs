//! Gzip response compression.
//!
//! # Responsibilities
//! - Negotiate gzip from `Accept-Encoding`
//! - Sniff a missing Content-Type from the first body chunk
//! - Stream the body through a gzip encoder
//!
//! # Design Decisions
//! - Responses are left untouched when the client did not ask for gzip
//! - The encoder writes its trailer when the inner body ends; a body error
//!   aborts the stream instead of producing a silently truncated archive

use std::convert::Infallible;
use std::io;
use std::task::{Context, Poll};

use async_compression::tokio::bufread::GzipEncoder;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request};
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::{stream, StreamExt, TryStreamExt};
use tokio_util::io::{ReaderStream, StreamReader};
use tower::{Layer, Service, ServiceExt};

use crate::http::{response, sniff};

/// Compresses response bodies for clients accepting gzip.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipLayer;

impl GzipLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for GzipLayer {
    type Service = Gzip<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Gzip { inner }
    }
}

/// Service produced by [`GzipLayer`].
#[derive(Debug, Clone)]
pub struct Gzip<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for Gzip<S>
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
        let wants_gzip = accepts_gzip(request.headers());
        let is_head = request.method() == Method::HEAD;
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.oneshot(request).await?;
            if !wants_gzip || !compressible(&response) {
                return Ok(response);
            }
            Ok(compress(response, is_head).await)
        })
    }
}

/// True when some `Accept-Encoding` entry names gzip with a non-zero weight.
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|entry| {
            let mut params = entry.split(';');
            let coding = params.next().unwrap_or_default().trim();
            if !coding.eq_ignore_ascii_case("gzip") {
                return false;
            }
            !params.any(|param| {
                let param = param.trim();
                param
                    .strip_prefix("q=")
                    .or_else(|| param.strip_prefix("Q="))
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .is_some_and(|q| q == 0.0)
            })
        })
}

fn compressible(response: &Response) -> bool {
    !response::is_bodiless(response.status()) && !response.headers().contains_key(header::CONTENT_ENCODING)
}

async fn compress(response: Response, is_head: bool) -> Response {
    let (mut parts, body) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    parts
        .headers
        .append(header::VARY, HeaderValue::from_static("Accept-Encoding"));

    if is_head {
        return Response::from_parts(parts, Body::empty());
    }

    let mut data = body.into_data_stream();
    let first = data.next().await;
    if !parts.headers.contains_key(header::CONTENT_TYPE) {
        if let Some(Ok(chunk)) = &first {
            let sniffed = sniff::detect_content_type(chunk);
            parts
                .headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(sniffed));
        }
    }

    let chunks = stream::iter(first).chain(data).map_err(io::Error::other);
    let encoder = GzipEncoder::new(StreamReader::new(chunks));
    Response::from_parts(parts, Body::from_stream(ReaderStream::new(encoder)))
}
