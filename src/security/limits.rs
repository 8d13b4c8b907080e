//! Request size limits.
//!
//! The body is buffered in full before forwarding, so its size is capped.
//! A declared `Content-Length` over the cap is rejected without reading.

use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_LENGTH;
use axum::http::HeaderMap;
use futures_util::StreamExt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// The client went away or sent a malformed body before it ended.
    #[error("request body could not be read: {0}")]
    Read(String),
}

/// Buffer a request body, refusing anything above `limit` bytes.
pub async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, BodyError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(BodyError::TooLarge { limit });
    }

    let mut buffered = Vec::with_capacity(declared.map_or(0, |len| len as usize));
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| BodyError::Read(e.to_string()))?;
        if buffered.len() + chunk.len() > limit {
            return Err(BodyError::TooLarge { limit });
        }
        buffered.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buffered))
}
