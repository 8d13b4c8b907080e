//! HTTP client for the upstream API.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::config::UpstreamConfig;
use crate::upstream::{describe_error, Upstream, UpstreamError, UpstreamResponse};

/// [`Upstream`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Build the client. Timeouts other than the optional connect timeout are
    /// left at the client defaults.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn post_json(&self, url: &str, body: Bytes) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(describe_error(&e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Body(describe_error(&e)))?;

        Ok(UpstreamResponse { status, body })
    }
}
