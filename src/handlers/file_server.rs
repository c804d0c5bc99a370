//! Static file serving from a [`ContentSource`].
//!
//! # Responsibilities
//! - Map request paths onto the source (decode, clean, open)
//! - Canonicalise directory and file URLs with relative redirects
//! - Serve `index.html` for directories, or a listing when there is none
//! - Content-Type, Content-Length, Last-Modified and conditional GET
//!
//! # Design Decisions
//! - Lookup failures become a status before any body byte is produced, so
//!   a denied listing replaces the whole response
//! - File bodies are streamed, never buffered whole

use std::io::SeekFrom;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::Response;
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::handlers::listing;
use crate::handlers::source::{ContentSource, OpenError, Resource};
use crate::handlers::{terminal, Handler, Terminal};
use crate::http::{response, sniff};
use crate::routing::clean_path;

const INDEX_PAGE: &str = "index.html";

/// Serves the files of a content source.
#[derive(Debug, Clone)]
pub struct FileServer<S> {
    source: S,
}

impl<S: ContentSource> FileServer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn into_handler(self) -> Handler {
        terminal(self)
    }

    async fn serve_directory(&self, request: &Parts, name: &str, modified: Option<SystemTime>) -> Response {
        let index = format!("{}/{INDEX_PAGE}", name.trim_end_matches('/'));
        match self.source.open(&index).await {
            Ok(Resource::File {
                path,
                file,
                len,
                modified,
            }) => return serve_file(request, &path, file, len, modified).await,
            Ok(Resource::Directory { .. }) => {}
            Err(OpenError::ListingDenied) => return status_for(OpenError::ListingDenied),
            Err(_) => {}
        }

        if is_not_modified(request, modified) {
            return not_modified(modified);
        }

        let entries = match self.source.list(name).await {
            Ok(entries) => entries,
            Err(e) => return status_for(e),
        };
        let page = listing::render(&entries);

        let mut listing = Response::new(body_unless_head(request, page));
        let headers = listing.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        set_last_modified(headers, modified);
        listing
    }
}

impl<S: ContentSource> Terminal for FileServer<S> {
    async fn serve(&self, request: Request<Body>) -> Response {
        let (request, _) = request.into_parts();
        let Ok(decoded) = percent_decode_str(request.uri.path()).decode_utf8() else {
            return status_for(OpenError::NotFound);
        };
        let mut upath = decoded.into_owned();
        if !upath.starts_with('/') {
            upath.insert(0, '/');
        }

        if upath.ends_with(&format!("/{INDEX_PAGE}")) {
            return local_redirect(&request, "./");
        }

        let name = clean_path(&upath);
        let resource = match self.source.open(&name).await {
            Ok(resource) => resource,
            Err(e) => return status_for(e),
        };

        let base = upath.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
        match resource {
            Resource::Directory { .. } if !upath.ends_with('/') => local_redirect(&request, &format!("{base}/")),
            Resource::File { .. } if upath.ends_with('/') => local_redirect(&request, &format!("../{base}")),
            Resource::Directory { modified } => self.serve_directory(&request, &name, modified).await,
            Resource::File {
                path,
                file,
                len,
                modified,
            } => serve_file(&request, &path, file, len, modified).await,
        }
    }
}

async fn serve_file(
    request: &Parts,
    path: &std::path::Path,
    mut file: File,
    len: u64,
    modified: Option<SystemTime>,
) -> Response {
    if is_not_modified(request, modified) {
        return not_modified(modified);
    }

    let head = match read_head(&mut file).await {
        Ok(head) => head,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read file");
            return status_for(OpenError::Io(e));
        }
    };
    let content_type = sniff::content_type_for(path, &head);

    let body = if request.method == Method::HEAD {
        Body::empty()
    } else {
        Body::from_stream(ReaderStream::new(file))
    };

    let mut served = Response::new(body);
    let headers = served.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    set_last_modified(headers, modified);
    served
}

/// First bytes of the file for sniffing; the file is rewound afterwards.
async fn read_head(file: &mut File) -> std::io::Result<Vec<u8>> {
    let mut head = vec![0; sniff::SNIFF_LEN];
    let mut filled = 0;
    while filled < head.len() {
        let n = file.read(&mut head[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    head.truncate(filled);
    file.seek(SeekFrom::Start(0)).await?;
    Ok(head)
}

fn status_for(error: OpenError) -> Response {
    let status = match error {
        OpenError::NotFound => StatusCode::NOT_FOUND,
        OpenError::PermissionDenied => StatusCode::FORBIDDEN,
        OpenError::ListingDenied => {
            tracing::debug!("Directory listing denied");
            StatusCode::FORBIDDEN
        }
        OpenError::Io(e) => {
            tracing::warn!(error = %e, "File lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    response::status_text(status)
}

/// Redirect relative to the current request path, keeping the query.
fn local_redirect(request: &Parts, target: &str) -> Response {
    let mut location = utf8_percent_encode(target, listing::HREF).to_string();
    if let Some(query) = request.uri.query() {
        location.push('?');
        location.push_str(query);
    }

    let mut redirect = response::empty(StatusCode::MOVED_PERMANENTLY);
    match HeaderValue::from_str(&location) {
        Ok(value) => {
            redirect.headers_mut().insert(header::LOCATION, value);
            redirect
        }
        Err(_) => response::status_text(StatusCode::BAD_REQUEST),
    }
}

fn body_unless_head(request: &Parts, content: String) -> Body {
    if request.method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(content)
    }
}

/// Modification time usable in headers: known and after the epoch.
fn header_time(modified: Option<SystemTime>) -> Option<SystemTime> {
    let since_epoch = modified?.duration_since(UNIX_EPOCH).ok()?;
    if since_epoch.is_zero() {
        return None;
    }
    // HTTP dates have one-second resolution.
    Some(UNIX_EPOCH + Duration::from_secs(since_epoch.as_secs()))
}

fn set_last_modified(headers: &mut axum::http::HeaderMap, modified: Option<SystemTime>) {
    if let Some(time) = header_time(modified) {
        if let Ok(value) = HeaderValue::from_str(&httpdate::fmt_http_date(time)) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }
}

fn is_not_modified(request: &Parts, modified: Option<SystemTime>) -> bool {
    if request.method != Method::GET && request.method != Method::HEAD {
        return false;
    }
    let Some(modified) = header_time(modified) else {
        return false;
    };
    request
        .headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok())
        .is_some_and(|since| modified <= since)
}

fn not_modified(modified: Option<SystemTime>) -> Response {
    let mut response = response::empty(StatusCode::NOT_MODIFIED);
    set_last_modified(response.headers_mut(), modified);
    response
}
