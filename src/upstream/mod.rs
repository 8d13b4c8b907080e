//! Upstream API subsystem.
//!
//! # Data Flow
//! ```text
//! resolved UpstreamPath
//!     → upstream_url (base + path)
//!     → Upstream::post_json (client.rs, one POST, no retries)
//!     → UpstreamResponse (status + raw body) | UpstreamError (transport)
//! ```
//!
//! # Design Decisions
//! - The body goes out exactly as received and comes back exactly as sent
//! - Upstream 4xx/5xx are responses, not errors
//! - `Upstream` is a trait; tests substitute an in-process double

pub mod client;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::StatusCode;
use thiserror::Error;

use crate::routing::UpstreamPath;

pub use client::HttpUpstream;

/// Status and raw body returned by the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Failure to obtain a response from the upstream at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Connect, DNS, TLS or timeout failure while sending the request.
    #[error("{0}")]
    Transport(String),

    /// The response started but its body could not be read.
    #[error("{0}")]
    Body(String),
}

/// Something the relay can POST JSON to.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// POST `body` to `url` with JSON content negotiation headers.
    async fn post_json(&self, url: &str, body: Bytes) -> Result<UpstreamResponse, UpstreamError>;
}

/// Full upstream URL for a resolved path. The base is used verbatim.
pub fn upstream_url(base_url: &str, path: &UpstreamPath) -> String {
    format!("{}{}", base_url, path.as_str())
}

/// Render an error and its causes as one line, skipping causes whose text is
/// already part of the message.
pub fn describe_error(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
