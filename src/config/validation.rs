//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Upstream base addresses must be absolute `http` URLs with a host
//! - Value ranges (timeouts > 0, prefixes rooted at `/`)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Route ordering is checked when the route table is built, not here

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: {value:?} is not a valid URL ({reason})")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field}: scheme {scheme:?} is not supported, only http")]
    UnsupportedScheme { field: &'static str, scheme: String },

    #[error("{field}: must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("{field}: path prefix {value:?} must start with '/'")]
    RelativePath { field: &'static str, value: String },

    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("observability.metrics_address: {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Validate a merged configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    for (field, value) in [
        ("upstreams.monolith_url", &config.upstreams.monolith_url),
        ("upstreams.movies_url", &config.upstreams.movies_url),
        ("upstreams.events_url", &config.upstreams.events_url),
    ] {
        if let Err(e) = check_upstream_url(field, value) {
            errors.push(e);
        }
    }

    for (field, value) in [
        ("paths.movies_health", &config.paths.movies_health),
        ("paths.movies", &config.paths.movies),
        ("paths.events", &config.paths.events),
    ] {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: value.clone(),
            });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "timeouts.connect_secs",
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "timeouts.request_secs",
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check one upstream base address.
pub fn check_upstream_url(field: &'static str, value: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(value).map_err(|e| ValidationError::InvalidUrl {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" {
        return Err(ValidationError::UnsupportedScheme {
            field,
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().is_none() {
        return Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}
