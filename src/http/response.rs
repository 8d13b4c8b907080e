//! Response construction.
//!
//! # Responsibilities
//! - Build each of the relay's response kinds with its header set
//! - Pass upstream bodies through without re-encoding
//! - Encode local errors as `{"error": "<message>"}`

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::security::CorsHeaders;
use crate::upstream::UpstreamResponse;

pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body too large";
pub const BODY_UNREADABLE_MESSAGE: &str = "Request body could not be read";

/// A fully built relay response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RelayResponse {
    /// `OPTIONS`: 200, empty body, preflight headers.
    pub fn preflight(cors: &CorsHeaders) -> Self {
        Self {
            status: StatusCode::OK,
            headers: cors.preflight(),
            body: Bytes::new(),
        }
    }

    pub fn method_not_allowed(cors: &CorsHeaders) -> Self {
        Self::error(cors, StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE)
    }

    pub fn body_too_large(cors: &CorsHeaders) -> Self {
        Self::error(cors, StatusCode::PAYLOAD_TOO_LARGE, BODY_TOO_LARGE_MESSAGE)
    }

    /// The client stopped sending or sent a broken body.
    pub fn body_unreadable(cors: &CorsHeaders) -> Self {
        Self::error(cors, StatusCode::BAD_REQUEST, BODY_UNREADABLE_MESSAGE)
    }

    /// Transport failure talking to the upstream: 500 with the failure message.
    pub fn proxy_failed(cors: &CorsHeaders, message: &str) -> Self {
        Self::error(cors, StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Upstream status and body, verbatim.
    pub fn relayed(cors: &CorsHeaders, upstream: UpstreamResponse) -> Self {
        Self {
            status: upstream.status,
            headers: cors.relayed(),
            body: upstream.body,
        }
    }

    fn error(cors: &CorsHeaders, status: StatusCode, message: &str) -> Self {
        Self {
            status,
            headers: cors.error(),
            body: error_body(message),
        }
    }
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, Body::from(self.body)).into_response()
    }
}

/// `{"error":"<message>"}`, with the message JSON-escaped.
pub fn error_body(message: &str) -> Bytes {
    Bytes::from(serde_json::json!({ "error": message }).to_string())
}
