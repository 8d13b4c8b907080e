//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay handler on every path
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener and shut down gracefully
//! - Buffer the inbound body and hand the request to the relay
//! - Bound each request by `timeouts.request_secs`, answering with CORS headers

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header::InvalidHeaderValue, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::time::timeout_at;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::relay::{Relay, RelayOutcome};
use crate::http::request::{request_id, InboundRequest, RelayRequestId};
use crate::http::response::RelayResponse;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::routing::PathResolver;
use crate::security::{read_body, BodyError, CorsHeaders};
use crate::upstream::{HttpUpstream, Upstream};

/// Error type for server construction.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid CORS header value: {0}")]
    Cors(#[from] InvalidHeaderValue),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub max_body_size: usize,
    pub request_timeout: Duration,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a server that forwards through a real HTTP client.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let upstream = Arc::new(HttpUpstream::new(&config.upstream)?);
        Self::with_upstream(config, upstream)
    }

    /// Create a server that forwards through the given upstream.
    pub fn with_upstream(
        config: RelayConfig,
        upstream: Arc<dyn Upstream>,
    ) -> Result<Self, ServerError> {
        let relay = Relay::new(
            PathResolver::from_config(&config.resolver),
            upstream,
            config.upstream.base_url.clone(),
            CorsHeaders::from_config(&config.cors)?,
        );

        let state = AppState {
            relay: Arc::new(relay),
            max_body_size: config.security.max_body_size,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RelayRequestId))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Relay handler mounted on every path.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let deadline = tokio::time::Instant::now() + state.request_timeout;
    let request_id = request_id(request.headers()).to_string();
    let (parts, body) = request.into_parts();

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        "Inbound request"
    );

    if let Some((outcome, response)) = state.relay.gate(&parts.method) {
        return finish(outcome, response, start_time);
    }

    let read = timeout_at(deadline, read_body(&parts.headers, body, state.max_body_size));
    let body = match read.await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected request body");
            let response = match e {
                BodyError::TooLarge { .. } => RelayResponse::body_too_large(state.relay.cors()),
                BodyError::Read(_) => RelayResponse::body_unreadable(state.relay.cors()),
            };
            return finish(RelayOutcome::BodyRejected, response, start_time);
        }
        Err(_) => {
            tracing::warn!(
                request_id = %request_id,
                timeout = ?state.request_timeout,
                "Request body not received in time"
            );
            let response = RelayResponse::body_unreadable(state.relay.cors());
            return finish(RelayOutcome::BodyRejected, response, start_time);
        }
    };

    let inbound = InboundRequest::new(parts.method, parts.uri.path(), parts.headers, body);
    let forwarded = timeout_at(deadline, state.relay.forward(inbound, &request_id));
    let (outcome, response) = match forwarded.await {
        Ok(answer) => answer,
        Err(_) => {
            tracing::error!(
                request_id = %request_id,
                timeout = ?state.request_timeout,
                "Upstream timed out"
            );
            let message = format!("upstream did not respond within {:?}", state.request_timeout);
            (
                RelayOutcome::ProxyFailed,
                RelayResponse::proxy_failed(state.relay.cors(), &message),
            )
        }
    };
    finish(outcome, response, start_time)
}

fn finish(outcome: RelayOutcome, response: RelayResponse, start_time: Instant) -> Response {
    metrics::record_request(outcome, response.status, start_time);
    response.into_response()
}
