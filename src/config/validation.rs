//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream base URL and listener addresses
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Reject CORS values that cannot be sent as header values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("upstream.base_url '{0}' is not a valid URL")]
    BaseUrl(String),

    #[error("upstream.base_url must use http or https, got '{0}'")]
    BaseUrlScheme(String),

    #[error("upstream.base_url must not carry a query or fragment")]
    BaseUrlSuffix,

    #[error("cors.{field} value '{value}' is not a valid header value")]
    CorsValue { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("security.max_body_size must be greater than zero")]
    BodyLimit,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::BaseUrlScheme(url.scheme().to_string()));
            }
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::BaseUrlSuffix);
            }
        }
        Err(_) => errors.push(ValidationError::BaseUrl(config.upstream.base_url.clone())),
    }

    let cors = &config.cors;
    let joined_headers = cors.allow_headers.join(", ");
    let joined_methods = cors.allow_methods.join(", ");
    for (field, value) in [
        ("allow_origin", cors.allow_origin.as_str()),
        ("allow_headers", joined_headers.as_str()),
        ("allow_methods", joined_methods.as_str()),
    ] {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::CorsValue {
                field,
                value: value.to_string(),
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::BodyLimit);
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
