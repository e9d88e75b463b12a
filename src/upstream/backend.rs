//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream service by name and base address
//! - Pre-compute the authority used for the outbound `Host` header
//! - Build upstream URIs from a request's full path and query

use axum::http::{uri::PathAndQuery, HeaderValue, Uri};
use url::Url;

use crate::config::validation::{check_upstream_url, ValidationError};

/// Errors raised while constructing a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend {name}: {source}")]
    Address {
        name: String,
        source: ValidationError,
    },

    #[error("backend {name}: authority {authority:?} is not a valid Host header")]
    Authority { name: String, authority: String },
}

/// A single upstream service.
#[derive(Debug)]
pub struct Backend {
    name: String,
    /// Base URL as configured, without a trailing slash.
    base: String,
    host_header: HeaderValue,
}

impl Backend {
    /// Create a backend from a name and an `http://host[:port][/prefix]` base address.
    pub fn new(name: impl Into<String>, base_address: &str) -> Result<Self, BackendError> {
        let name = name.into();
        let url = check_upstream_url("base address", base_address).map_err(|source| {
            BackendError::Address {
                name: name.clone(),
                source,
            }
        })?;

        let authority = authority_of(&url);
        let host_header =
            HeaderValue::from_str(&authority).map_err(|_| BackendError::Authority {
                name: name.clone(),
                authority: authority.clone(),
            })?;

        let mut base = url.as_str().to_string();
        if let Some(query_start) = base.find(['?', '#']) {
            base.truncate(query_start);
        }
        let base = base.trim_end_matches('/').to_string();

        Ok(Self {
            name,
            base,
            host_header,
        })
    }

    /// Identifier used in logs and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `host[:port]` the upstream expects in its `Host` header.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Absolute upstream URI for the given original path and query.
    ///
    /// The asterisk form (`OPTIONS *`) has no path to append and is sent to
    /// the base path instead.
    pub fn upstream_uri(&self, path_and_query: &PathAndQuery) -> Result<Uri, axum::http::Error> {
        let path_and_query = match path_and_query.as_str() {
            "*" => "/",
            other => other,
        };
        let uri = format!("{}{}", self.base, path_and_query).parse::<Uri>()?;
        Ok(uri)
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.base)
    }
}

fn authority_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
