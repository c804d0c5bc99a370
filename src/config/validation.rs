//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (statuses, addresses)
//! - Check certificate files exist for https listeners
//! - Detect conflicting routes and status overrides
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::{Headers, Protocol, ServerConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no listeners defined")]
    NoListeners,
    #[error("no serves defined")]
    NoServes,
    #[error("listener #{0}: invalid address `{1}`")]
    InvalidAddress(usize, String),
    #[error("listener #{0}: certificate supplied for non-HTTPS listener")]
    UnexpectedCertificate(usize),
    #[error("listener #{0}: {1} file `{2}` does not exist")]
    MissingTlsFile(usize, &'static str, String),
    #[error("serve #{0}: path `{1}` must start with `/`")]
    InvalidPath(usize, String),
    #[error("serve #{0}: no target path specified")]
    MissingTarget(usize),
    #[error("serve #{0}: error specified with target path")]
    TargetWithError(usize),
    #[error("serve #{0}: invalid error status {1}")]
    InvalidErrorStatus(usize, u16),
    #[error("redirect #{0}: no `from` path")]
    MissingFrom(usize),
    #[error("redirect #{0}: no `to` path")]
    MissingTo(usize),
    #[error("redirect #{0}: status {1} is not a redirect status")]
    InvalidRedirectStatus(usize, u16),
    #[error("error #{0}: invalid status {1}")]
    InvalidOverrideStatus(usize, u16),
    #[error("error #{0}: no target file specified")]
    MissingErrorTarget(usize),
    #[error("{0}: invalid header `{1}`")]
    InvalidHeader(String, String),
    #[error("route `{0}` registered more than once")]
    DuplicateRoute(String),
    #[error("handler for status {0} registered more than once")]
    DuplicateOverride(u16),
}

/// Check a sanitised configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listeners.is_empty() {
        errors.push(ValidationError::NoListeners);
    }
    for (i, listener) in config.listeners.iter().enumerate() {
        if !is_listen_address(&listener.addr) {
            errors.push(ValidationError::InvalidAddress(i, listener.addr.clone()));
        }
        match listener.protocol {
            Protocol::Http => {
                if listener.cert.is_some() || listener.key.is_some() {
                    errors.push(ValidationError::UnexpectedCertificate(i));
                }
            }
            Protocol::Https => {
                check_tls_file(&mut errors, i, "cert", listener.cert.as_deref());
                check_tls_file(&mut errors, i, "key", listener.key.as_deref());
            }
        }
        check_headers(&mut errors, &format!("listener #{i}"), &listener.headers);
    }

    if config.serves.is_empty() {
        errors.push(ValidationError::NoServes);
    }
    let mut routes = HashSet::new();
    for (i, serve) in config.serves.iter().enumerate() {
        if !serve.path.starts_with('/') {
            errors.push(ValidationError::InvalidPath(i, serve.path.clone()));
        }
        match (serve.error, &serve.target) {
            (None, None) => errors.push(ValidationError::MissingTarget(i)),
            (Some(_), Some(_)) => errors.push(ValidationError::TargetWithError(i)),
            (Some(status), None) if !is_valid_status(status) => {
                errors.push(ValidationError::InvalidErrorStatus(i, status))
            }
            _ => {}
        }
        check_headers(&mut errors, &format!("serve #{i}"), &serve.headers);
        if !routes.insert(serve.path.as_str()) {
            errors.push(ValidationError::DuplicateRoute(serve.path.clone()));
        }
    }

    for (i, redirect) in config.redirects.iter().enumerate() {
        if redirect.from.is_empty() {
            errors.push(ValidationError::MissingFrom(i));
        } else if !routes.insert(redirect.from.as_str()) {
            errors.push(ValidationError::DuplicateRoute(redirect.from.clone()));
        }
        if redirect.to.is_empty() {
            errors.push(ValidationError::MissingTo(i));
        }
        let status = redirect.status();
        if !(300..=399).contains(&status) {
            errors.push(ValidationError::InvalidRedirectStatus(i, status));
        }
    }

    let mut statuses = HashSet::new();
    for (i, page) in config.errors.iter().enumerate() {
        if !is_valid_status(page.status) {
            errors.push(ValidationError::InvalidOverrideStatus(i, page.status));
        }
        if page.target.as_os_str().is_empty() {
            errors.push(ValidationError::MissingErrorTarget(i));
        }
        if !statuses.insert(page.status) {
            errors.push(ValidationError::DuplicateOverride(page.status));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port` with a numeric port. Host names are resolved at bind time.
fn is_listen_address(addr: &str) -> bool {
    if addr.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains(':')
                && !host.contains(char::is_whitespace)
                && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

fn is_valid_status(status: u16) -> bool {
    (100..=599).contains(&status)
}

fn check_tls_file(errors: &mut Vec<ValidationError>, i: usize, kind: &'static str, path: Option<&Path>) {
    match path {
        Some(path) if path.exists() => {}
        Some(path) => errors.push(ValidationError::MissingTlsFile(i, kind, path.display().to_string())),
        None => errors.push(ValidationError::MissingTlsFile(i, kind, String::new())),
    }
}

fn check_headers(errors: &mut Vec<ValidationError>, scope: &str, headers: &Headers) {
    for (name, value) in headers {
        if HeaderName::try_from(name.as_str()).is_err() || HeaderValue::try_from(value.as_str()).is_err() {
            errors.push(ValidationError::InvalidHeader(scope.to_string(), name.clone()));
        }
    }
}
