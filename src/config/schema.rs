//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Custom response headers, keyed by header name.
pub type Headers = BTreeMap<String, String>;

/// Root configuration for the static file server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Which status reaches the client when an override handler runs.
    pub override_status: OverridePolicy,

    /// Listeners accepting connections.
    pub listeners: Vec<ListenerConfig>,

    /// Directories (or fixed errors) served under URL path prefixes.
    pub serves: Vec<ServeConfig>,

    /// Fixed redirects.
    pub redirects: Vec<RedirectConfig>,

    /// Pages substituted for selected response statuses.
    pub errors: Vec<ErrorPageConfig>,
}

impl ServerConfig {
    /// Configuration used when no file is given: one plaintext listener
    /// serving `target` at `/`.
    pub fn for_directory(addr: impl Into<String>, target: impl AsRef<Path>) -> Self {
        Self {
            listeners: vec![ListenerConfig {
                addr: addr.into(),
                ..ListenerConfig::default()
            }],
            serves: vec![ServeConfig {
                target: Some(target.as_ref().to_path_buf()),
                ..ServeConfig::default()
            }],
            ..Self::default()
        }
    }

    /// Fill in defaults left open by the config file.
    pub fn sanitise(&mut self) {
        for listener in &mut self.listeners {
            listener.sanitise();
        }
        for serve in &mut self.serves {
            serve.sanitise();
        }
        for redirect in &mut self.redirects {
            redirect.sanitise();
        }
    }
}

/// Status policy applied when an override handler takes over a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePolicy {
    /// The client always receives the status that triggered the override.
    #[default]
    #[serde(alias = "preserve")]
    PreserveStatus,
    /// The override handler decides the status it sends.
    #[serde(alias = "handler")]
    HandlerStatus,
}

/// Transport protocol of a listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// `http` or `https`.
    pub protocol: Protocol,

    /// Bind address (e.g., "0.0.0.0:8080" or ":8080").
    pub addr: String,

    /// Path to certificate file (PEM), https only.
    pub cert: Option<PathBuf>,

    /// Path to private key file (PEM), https only.
    pub key: Option<PathBuf>,

    /// Headers added to every response that lacks them.
    pub headers: Headers,

    /// Gzip responses for clients that accept it.
    pub gzip: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            addr: "0.0.0.0:80".to_string(),
            cert: None,
            key: None,
            headers: Headers::new(),
            gzip: false,
        }
    }
}

impl ListenerConfig {
    fn sanitise(&mut self) {
        if self.addr.is_empty() {
            self.addr = ListenerConfig::default().addr;
        } else if self.addr.starts_with(':') {
            self.addr = format!("0.0.0.0{}", self.addr);
        }
    }
}

/// A URL path prefix served from a directory, or answered with a fixed error.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServeConfig {
    /// URL path prefix; a trailing `/` serves the whole subtree.
    pub path: String,

    /// Directory the files are read from.
    pub target: Option<PathBuf>,

    /// Status answered for every request instead of serving files.
    pub error: Option<u16>,

    /// Answer 403 instead of listing directories without an index.
    pub prevent_listing: bool,

    /// Headers added to responses of this serve.
    pub headers: Headers,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            target: None,
            error: None,
            prevent_listing: false,
            headers: Headers::new(),
        }
    }
}

impl ServeConfig {
    fn sanitise(&mut self) {
        if self.path.is_empty() {
            self.path = "/".to_string();
        }
    }
}

/// Redirect from one path to another URL.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub from: String,
    pub to: String,
    /// Redirect status (default: 301).
    pub status: Option<u16>,
}

impl RedirectConfig {
    pub const DEFAULT_STATUS: u16 = 301;

    fn sanitise(&mut self) {
        if self.status.is_none() {
            tracing::info!(
                from = %self.from,
                status = Self::DEFAULT_STATUS,
                "Defaulting redirect status code"
            );
            self.status = Some(Self::DEFAULT_STATUS);
        }
    }

    /// Effective redirect status.
    pub fn status(&self) -> u16 {
        self.status.unwrap_or(Self::DEFAULT_STATUS)
    }
}

/// Page served in place of a response with the given status.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorPageConfig {
    pub status: u16,
    pub target: PathBuf,
}
