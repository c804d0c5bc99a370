//! Canned responses shared by the handlers and the interceptor.
//!
//! # Design Decisions
//! - Error bodies are the short reason phrase, `text/plain`, never HTML
//! - Bodies are never fabricated for success or redirect statuses

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;

/// Standard reason phrase for a status, empty when the code has none.
pub fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

/// A response carrying only a status.
pub fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// A response whose body is the reason phrase of `status`.
pub fn status_text(status: StatusCode) -> Response {
    let mut response = Response::new(Body::from(reason_phrase(status)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// True for statuses that never carry a body.
pub fn is_bodiless(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn status_text_body_is_reason_phrase() {
        let response = status_text(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Not Found");
    }

    #[test]
    fn unknown_status_has_empty_phrase() {
        assert_eq!(reason_phrase(StatusCode::from_u16(599).unwrap()), "");
    }

    #[test]
    fn escapes_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&#34;x&#34;&gt;&amp;&#39;");
    }

    #[test]
    fn bodiless_statuses() {
        assert!(is_bodiless(StatusCode::NOT_MODIFIED));
        assert!(is_bodiless(StatusCode::CONTINUE));
        assert!(!is_bodiless(StatusCode::OK));
    }
}
