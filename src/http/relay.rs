//! The relay itself: preflight, method gate, path inference, forwarding.
//!
//! Every request ends in exactly one [`RelayOutcome`]; there are no retries
//! and no intermediate states.

use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::http::request::InboundRequest;
use crate::http::response::RelayResponse;
use crate::routing::resolver::{FORWARDED_URI_HEADER, ORIGINAL_PATH_HEADER};
use crate::routing::PathResolver;
use crate::security::CorsHeaders;
use crate::upstream::{upstream_url, Upstream};

/// Terminal state of one relayed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Preflight,
    MethodRejected,
    BodyRejected,
    Relayed,
    ProxyFailed,
}

impl RelayOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RelayOutcome::Preflight => "preflight",
            RelayOutcome::MethodRejected => "method_rejected",
            RelayOutcome::BodyRejected => "body_rejected",
            RelayOutcome::Relayed => "relayed",
            RelayOutcome::ProxyFailed => "proxy_failed",
        }
    }
}

impl fmt::Display for RelayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forwards POSTs to one upstream API.
pub struct Relay {
    resolver: PathResolver,
    upstream: Arc<dyn Upstream>,
    base_url: String,
    cors: CorsHeaders,
}

impl Relay {
    pub fn new(
        resolver: PathResolver,
        upstream: Arc<dyn Upstream>,
        base_url: impl Into<String>,
        cors: CorsHeaders,
    ) -> Self {
        Self {
            resolver,
            upstream,
            base_url: base_url.into(),
            cors,
        }
    }

    pub fn cors(&self) -> &CorsHeaders {
        &self.cors
    }

    /// Answer requests that never reach the upstream. Looks at the method only.
    pub fn gate(&self, method: &Method) -> Option<(RelayOutcome, RelayResponse)> {
        if method == Method::OPTIONS {
            return Some((RelayOutcome::Preflight, RelayResponse::preflight(&self.cors)));
        }
        if method != Method::POST {
            return Some((
                RelayOutcome::MethodRejected,
                RelayResponse::method_not_allowed(&self.cors),
            ));
        }
        None
    }

    /// Resolve the upstream path and relay the body to it.
    pub async fn forward(
        &self,
        req: InboundRequest,
        request_id: &str,
    ) -> (RelayOutcome, RelayResponse) {
        let resolution = self.resolver.resolve(&req);
        let url = upstream_url(&self.base_url, &resolution.path);

        tracing::debug!(
            request_id = %request_id,
            request_path = %req.path,
            original_path = req.header(ORIGINAL_PATH_HEADER).as_deref().unwrap_or(""),
            forwarded_uri = req.header(FORWARDED_URI_HEADER).as_deref().unwrap_or(""),
            headers = ?req.header_names(),
            resolved_path = %resolution.path,
            source = %resolution.source,
            url = %url,
            body_preview = %req.body_preview(),
            "Relaying request"
        );

        match self.upstream.post_json(&url, req.body).await {
            Ok(upstream) => {
                tracing::debug!(
                    request_id = %request_id,
                    status = %upstream.status,
                    body = %String::from_utf8_lossy(&upstream.body),
                    "Upstream responded"
                );
                (
                    RelayOutcome::Relayed,
                    RelayResponse::relayed(&self.cors, upstream),
                )
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, url = %url, error = %e, "Upstream error");
                (
                    RelayOutcome::ProxyFailed,
                    RelayResponse::proxy_failed(&self.cors, &e.to_string()),
                )
            }
        }
    }

    /// Gate, then forward. The body must already be buffered.
    pub async fn handle(
        &self,
        req: InboundRequest,
        request_id: &str,
    ) -> (RelayOutcome, RelayResponse) {
        if let Some(answer) = self.gate(&req.method) {
            return answer;
        }
        self.forward(req, request_id).await
    }
}
