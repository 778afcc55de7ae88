//! The transport port: a generic "send request, get response" capability.
//!
//! Both the RPC failover client and the metadata resolver reach the network
//! only through [`Transport`]. Infrastructure crates (e.g. `fetch`) implement it
//! over a real HTTP client; tests implement it over scripted responses.
//!
//! Implementations report transport-level failures (connection refused, TLS,
//! body read errors) as [`TransportError`] and return every HTTP response,
//! including non-2xx ones, as a [`TransportResponse`]. Interpreting the status
//! is the caller's job.

use async_trait::async_trait;
use thiserror::Error;

/// HTTP method of a [`TransportRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`, used for metadata documents.
    Get,
    /// `POST`, used for JSON-RPC calls.
    Post,
}

/// A single outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// JSON body, sent with `Content-Type: application/json` when present.
    pub body: Option<serde_json::Value>,
}

impl TransportRequest {
    /// Builds a body-less `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            body: None,
        }
    }

    /// Builds a `POST` request carrying `body` as JSON.
    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            body: Some(body),
        }
    }
}

/// A complete response: status line and fully-read body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Creates a response from a status code and body bytes.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A failure below the HTTP layer: no response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport's own timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// The URL could not be used (unsupported scheme, malformed).
    #[error("invalid request URL {0}")]
    InvalidUrl(String),

    /// The response body exceeded the transport's size limit.
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge {
        /// The configured limit.
        limit: usize,
    },

    /// Any other transport failure (TLS, body read, protocol).
    #[error("{0}")]
    Other(String),
}

/// Sends requests and returns complete responses.
///
/// Object-safe so a single `Arc<dyn Transport>` can be shared by every
/// component of a resolver and across concurrent resolutions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and waits for the whole response body.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_2xx_statuses_are_success() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(199, "").is_success());
        assert!(!TransportResponse::new(301, "").is_success());
        assert!(!TransportResponse::new(429, "").is_success());
    }

    #[test]
    fn post_json_carries_the_body() {
        let request = TransportRequest::post_json("https://rpc", serde_json::json!({"id": 1}));
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body, Some(serde_json::json!({"id": 1})));
        assert_eq!(TransportRequest::get("https://x").body, None);
    }
}
