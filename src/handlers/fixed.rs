//! Fixed-status handlers: configured per-serve errors and status override pages.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::Response;

use crate::handlers::{terminal, Handler, Terminal};
use crate::http::{response, sniff};

/// Always answers with one status and its reason phrase.
#[derive(Debug, Clone)]
pub struct FixedError {
    status: StatusCode,
}

impl FixedError {
    pub fn canned(status: StatusCode) -> Self {
        Self { status }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn into_handler(self) -> Handler {
        terminal(self)
    }
}

impl Terminal for FixedError {
    async fn serve(&self, _request: Request<Body>) -> Response {
        response::status_text(self.status)
    }
}

/// A page file served in place of an intercepted status.
///
/// The page picks its own status like any file: `200 OK` when it can be
/// read. An unreadable page answers with the reason phrase of `fallback`,
/// the status that triggered the override.
#[derive(Debug, Clone)]
pub struct ErrorPage {
    fallback: StatusCode,
    path: PathBuf,
}

impl ErrorPage {
    pub fn new(fallback: StatusCode, path: impl Into<PathBuf>) -> Self {
        Self {
            fallback,
            path: path.into(),
        }
    }

    pub fn into_handler(self) -> Handler {
        terminal(self)
    }
}

impl Terminal for ErrorPage {
    async fn serve(&self, request: Request<Body>) -> Response {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Error page unreadable, using reason phrase");
                return response::status_text(self.fallback);
            }
        };

        let content_type = sniff::content_type_for(&self.path, &contents);
        let length = contents.len();
        let body = if request.method() == Method::HEAD {
            Body::empty()
        } else {
            Body::from(contents)
        };

        let mut response = Response::new(body);
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        response
    }
}
