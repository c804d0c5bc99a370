//! Custom response header injection.

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use tower::Layer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Headers;
use crate::handlers::{boxed, Handler};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid header `{name}: {value}`")]
pub struct InvalidHeader {
    pub name: String,
    pub value: String,
}

/// Ordered headers to add to every response that lacks them.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderSet {
    pub fn parse(headers: &Headers) -> Result<Self, InvalidHeader> {
        let entries = headers
            .iter()
            .map(|(name, value)| -> Result<_, InvalidHeader> {
                let invalid = || InvalidHeader {
                    name: name.clone(),
                    value: value.clone(),
                };
                let name = HeaderName::try_from(name.as_str()).map_err(|_| invalid())?;
                let value = HeaderValue::try_from(value.as_str()).map_err(|_| invalid())?;
                Ok((name, value))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Wrap `handler` so each header of `headers` is set only when the response
/// does not already carry it.
pub fn inject(handler: Handler, headers: &HeaderSet) -> Handler {
    headers.entries.iter().fold(handler, |inner, (name, value)| {
        boxed(SetResponseHeaderLayer::if_not_present(name.clone(), value.clone()).layer(inner))
    })
}
