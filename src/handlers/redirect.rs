//! Fixed redirect handler.

use axum::body::Body;
use axum::extract::OriginalUri;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::Response;

use crate::handlers::{terminal, Handler, Terminal};
use crate::http::response;
use crate::routing::clean_path;

/// Always redirects to one target.
#[derive(Debug, Clone)]
pub struct Redirect {
    to: String,
    status: StatusCode,
}

impl Redirect {
    pub fn new(to: impl Into<String>, status: StatusCode) -> Self {
        Self {
            to: to.into(),
            status,
        }
    }

    pub fn permanent(to: impl Into<String>) -> Self {
        Self::new(to, StatusCode::MOVED_PERMANENTLY)
    }

    pub fn into_handler(self) -> Handler {
        terminal(self)
    }

    /// Target resolved against the path of the request being redirected.
    fn location(&self, request_path: &str) -> String {
        if self.to.contains("://") || self.to.starts_with("//") {
            return self.to.clone();
        }

        let target = if self.to.starts_with('/') {
            self.to.clone()
        } else {
            let dir = match request_path.rfind('/') {
                Some(i) => &request_path[..=i],
                None => "/",
            };
            format!("{dir}{}", self.to)
        };

        let (path, query) = match target.find('?') {
            Some(i) => target.split_at(i),
            None => (target.as_str(), ""),
        };
        format!("{}{query}", clean_path(path))
    }
}

impl Terminal for Redirect {
    async fn serve(&self, request: Request<Body>) -> Response {
        let request_path = match request.extensions().get::<OriginalUri>() {
            Some(OriginalUri(uri)) => uri.path(),
            None => request.uri().path(),
        };
        let location = self.location(request_path);

        let Ok(location_value) = HeaderValue::from_str(&location) else {
            tracing::warn!(to = %self.to, "Redirect target is not a valid header value");
            return response::empty(StatusCode::INTERNAL_SERVER_ERROR);
        };

        let method = request.method();
        let body = if method == Method::GET {
            Body::from(format!(
                "<a href=\"{}\">{}</a>.\n\n",
                response::escape_html(&location),
                response::reason_phrase(self.status)
            ))
        } else {
            Body::empty()
        };

        let mut redirect = Response::new(body);
        *redirect.status_mut() = self.status;
        let headers = redirect.headers_mut();
        headers.insert(header::LOCATION, location_value);
        if method == Method::GET || method == Method::HEAD {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        }
        redirect
    }
}
