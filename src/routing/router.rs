//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes, longest prefix first
//! - Canonicalise request paths with redirects
//! - Look up the matching route for a request, or 404
//! - Strip the matched prefix before the route's handler runs
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (acceptable for typical route counts)
//! - `*` requests never reach a route or a status override

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::OriginalUri;
use axum::http::uri::PathAndQuery;
use axum::http::{header, HeaderValue, Method, Request, StatusCode, Uri, Version};
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::{service_fn, Layer, Service, ServiceExt};

use crate::config::{OverridePolicy, ServerConfig};
use crate::handlers::{boxed, Dir, ErrorPage, FileServer, FixedError, Handler, ListingGuard, Redirect};
use crate::http::middleware::{inject, HeaderSet};
use crate::http::response;
use crate::intercept::{InterceptLayer, StatusOverrides};
use crate::routing::{clean_path, BuildError, Pattern, RouteError};

/// A registered route.
#[derive(Clone)]
pub struct Route {
    pattern: Pattern,
    handler: Handler,
}

impl Route {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }
}

/// Prefix routes plus the status overrides applied to their responses.
#[derive(Clone)]
pub struct RoutingTable {
    routes: Vec<Route>,
    overrides: StatusOverrides,
    not_found: Handler,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            overrides: StatusOverrides::default(),
            not_found: FixedError::canned(StatusCode::NOT_FOUND).into_handler(),
        }
    }

    /// Build the table for a validated configuration.
    pub fn from_config(config: &ServerConfig) -> Result<Self, BuildError> {
        let mut table = Self::new();

        for serve in &config.serves {
            let handler = match (serve.error, &serve.target) {
                (Some(code), _) => FixedError::canned(status_from(code)?).into_handler(),
                (None, Some(target)) if serve.prevent_listing => {
                    FileServer::new(ListingGuard::new(Dir::new(target))).into_handler()
                }
                (None, Some(target)) => FileServer::new(Dir::new(target)).into_handler(),
                (None, None) => return Err(BuildError::MissingTarget(serve.path.clone())),
            };
            let headers = HeaderSet::parse(&serve.headers)?;
            table.register(&serve.path, inject(handler, &headers))?;
            tracing::debug!(path = %serve.path, "Registered serve");
        }

        for redirect in &config.redirects {
            let status = status_from(redirect.status())?;
            table.register(&redirect.from, Redirect::new(&redirect.to, status).into_handler())?;
            tracing::debug!(from = %redirect.from, to = %redirect.to, status = status.as_u16(), "Registered redirect");
        }

        for page in &config.errors {
            let status = status_from(page.status)?;
            table.register_status_override(status, ErrorPage::new(status, &page.target).into_handler())?;
        }

        tracing::info!(
            routes = table.routes.len(),
            overrides = table.overrides.len(),
            "Routing table built"
        );
        Ok(table)
    }

    /// Register `handler` for `prefix`. The handler sees request paths with
    /// the prefix removed.
    pub fn register(&mut self, prefix: &str, handler: Handler) -> Result<(), RouteError> {
        let pattern = Pattern::parse(prefix)?;
        if self.routes.iter().any(|route| route.pattern == pattern) {
            return Err(RouteError::DuplicateRoute(prefix.to_string()));
        }

        let handler = strip_prefix(pattern.clone(), handler);
        let at = self
            .routes
            .iter()
            .position(|route| route.pattern.len() < pattern.len())
            .unwrap_or(self.routes.len());
        self.routes.insert(at, Route { pattern, handler });
        Ok(())
    }

    pub fn register_status_override(&mut self, status: StatusCode, handler: Handler) -> Result<(), RouteError> {
        self.overrides.register(status, handler)
    }

    pub fn overrides(&self) -> &StatusOverrides {
        &self.overrides
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Longest registered pattern matching `path`.
    pub fn lookup(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.pattern.matches(path))
    }

    /// Handler answering `request`.
    pub fn dispatch(&self, request: &Request<Body>) -> Handler {
        if is_asterisk(request) {
            return boxed(service_fn(|request: Request<Body>| async move {
                Ok::<_, Infallible>(asterisk_response(request.version()))
            }));
        }

        let uri = request.uri();
        let path = uri.path();

        if request.method() != Method::CONNECT {
            let cleaned = clean_path(path);
            if cleaned != path {
                return Redirect::permanent(with_query(cleaned, uri)).into_handler();
            }
        }

        if !self.has_pattern(path) {
            let subtree = format!("{path}/");
            if self.has_pattern(&subtree) {
                return Redirect::permanent(with_query(subtree, uri)).into_handler();
            }
        }

        match self.lookup(path) {
            Some(route) => route.handler.clone(),
            None => self.not_found.clone(),
        }
    }

    fn has_pattern(&self, prefix: &str) -> bool {
        self.routes.iter().any(|route| route.pattern.as_str() == prefix)
    }
}

impl std::fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let patterns: Vec<_> = self.routes.iter().map(|r| r.pattern.as_str()).collect();
        f.debug_struct("RoutingTable")
            .field("routes", &patterns)
            .field("overrides", &self.overrides)
            .finish()
    }
}

/// Routing table plus interception, as one service.
#[derive(Clone)]
pub struct StaticMux {
    table: Arc<RoutingTable>,
    intercept: InterceptLayer,
}

impl StaticMux {
    pub fn new(table: Arc<RoutingTable>, policy: OverridePolicy) -> Self {
        let intercept = InterceptLayer::new(table.overrides().clone(), policy);
        Self { table, intercept }
    }
}

impl Service<Request<Body>> for StaticMux {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let handler = self.table.dispatch(&request);
        if is_asterisk(&request) {
            return Box::pin(handler.oneshot(request));
        }
        Box::pin(self.intercept.layer(handler).oneshot(request))
    }
}

fn is_asterisk(request: &Request<Body>) -> bool {
    request.uri().path() == "*"
}

fn asterisk_response(version: Version) -> Response {
    let mut response = response::empty(StatusCode::BAD_REQUEST);
    if version >= Version::HTTP_11 {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
    }
    response
}

fn with_query(path: String, uri: &Uri) -> String {
    match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    }
}

fn status_from(code: u16) -> Result<StatusCode, BuildError> {
    StatusCode::from_u16(code).map_err(|_| BuildError::InvalidStatus(code))
}

/// Rewrite the request path to what `pattern` leaves of it, remembering the
/// original URI.
fn strip_prefix(pattern: Pattern, handler: Handler) -> Handler {
    boxed(service_fn(move |mut request: Request<Body>| {
        let handler = handler.clone();
        let uri = request.uri().clone();
        let stripped = pattern.strip(uri.path());
        let path_and_query = match uri.query() {
            Some(query) => format!("{stripped}?{query}"),
            None => stripped.into_owned(),
        };

        if let Ok(path_and_query) = PathAndQuery::try_from(path_and_query) {
            let mut parts = uri.clone().into_parts();
            parts.path_and_query = Some(path_and_query);
            if let Ok(rewritten) = Uri::from_parts(parts) {
                *request.uri_mut() = rewritten;
            }
        }
        if request.extensions().get::<OriginalUri>().is_none() {
            request.extensions_mut().insert(OriginalUri(uri));
        }

        handler.oneshot(request)
    }))
}
