//! HTTP transport adapter.
//!
//! Implements the [`resolver::Transport`] trait over `reqwest`, for both the
//! JSON-RPC `POST`s made by [`resolver::RpcFailoverClient`] and the metadata
//! `GET`s made by [`resolver::MetadataResolver`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** TLS, connection pooling, header defaults and error
//! classification live here. The [`resolver`] crate sees only
//! [`resolver::Transport`]; per-attempt timeouts are enforced on that side so
//! they hold for any transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use resolver::{HttpMethod, Transport, TransportError, TransportRequest, TransportResponse};
use thiserror::Error;
use tracing::trace;

/// Settings for [`ReqwestTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Upper bound on establishing a TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Largest response body accepted; longer bodies fail with
    /// [`TransportError::BodyTooLarge`].
    pub max_body_bytes: usize,
}

/// Default response body limit (4 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("normie-resolver/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(5),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// The HTTP client could not be constructed.
#[derive(Debug, Error)]
pub enum TransportBuildError {
    /// `reqwest` rejected the client configuration (e.g. TLS backend failure).
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The configured user agent is not a valid header value.
    #[error("invalid user agent {0:?}")]
    UserAgent(String),
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl ReqwestTransport {
    /// Builds the underlying client.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportBuildError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| TransportBuildError::UserAgent(config.user_agent.clone()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = read_limited(response, self.max_body_bytes).await?;

        trace!(url = %request.url, status, bytes = body.len(), "HTTP exchange complete");
        Ok(TransportResponse::new(status, body))
    }
}

/// Reads the body chunk by chunk, failing as soon as it exceeds `limit`.
async fn read_limited(mut response: reqwest::Response, limit: usize) -> Result<Vec<u8>, TransportError> {
    let too_large = TransportError::BodyTooLarge { limit };
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(too_large);
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(classify)? {
        if body.len() + chunk.len() > limit {
            return Err(too_large);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Maps a `reqwest` failure onto the transport-neutral error type.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidUrl(
            err.url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| err.to_string()),
        )
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Accepts one connection, answers with `status_line` and `body`, and
    /// returns the raw request text it received.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                received.extend_from_slice(&chunk[..n]);
                if n == 0 || request_complete(&received) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&received).into_owned()
        });

        (url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(&TransportConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn get_returns_status_and_body() {
        let (url, server) = serve_once("200 OK", r#"{"name":"X"}"#).await;

        let response = transport().send(TransportRequest::get(&url)).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"name":"X"}"#);
        let request = server.await.unwrap();
        assert!(request.starts_with("GET / HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("user-agent: normie-resolver/"));
    }

    #[tokio::test]
    async fn non_success_statuses_are_responses_not_errors() {
        let (url, server) = serve_once("503 Service Unavailable", "busy").await;

        let response = transport().send(TransportRequest::get(&url)).await.unwrap();

        assert_eq!(response.status, 503);
        assert!(!response.is_success());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn post_sends_a_json_body() {
        let (url, server) = serve_once("200 OK", r#"{"result":"0x"}"#).await;
        let body = json!({"jsonrpc": "2.0", "method": "eth_call", "params": [], "id": 1});

        transport()
            .send(TransportRequest::post_json(&url, body.clone()))
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST / HTTP/1.1"));
        assert!(request
            .to_ascii_lowercase()
            .contains("content-type: application/json"));
        let sent = request.split("\r\n\r\n").nth(1).unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(sent).unwrap(), body);
    }

    #[tokio::test]
    async fn refused_connections_are_connection_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let err = transport().send(TransportRequest::get(&url)).await.unwrap_err();

        assert!(matches!(err, TransportError::Connection(_)), "{err:?}");
    }

    #[tokio::test]
    async fn unusable_urls_are_rejected() {
        let err = transport()
            .send(TransportRequest::get("not a url"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, TransportError::InvalidUrl(_) | TransportError::Other(_)),
            "{err:?}"
        );
    }

    /// Answers one connection with the raw `response` bytes. Write errors are
    /// ignored since the client may hang up once its body limit is hit.
    async fn serve_raw(response: String) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut chunk = [0u8; 1024];
            let _ = socket.read(&mut chunk).await;
            let _ = socket.write_all(response.as_bytes()).await;
        });
        (url, handle)
    }

    fn limited_transport(max_body_bytes: usize) -> ReqwestTransport {
        ReqwestTransport::new(&TransportConfig {
            max_body_bytes,
            ..TransportConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn declared_oversized_bodies_are_rejected() {
        let (url, server) = serve_raw(
            "HTTP/1.1 200 OK\r\nContent-Length: 16\r\nConnection: close\r\n\r\n0123456789abcdef".into(),
        )
        .await;

        let err = limited_transport(8)
            .send(TransportRequest::get(&url))
            .await
            .unwrap_err();

        assert_eq!(err, TransportError::BodyTooLarge { limit: 8 });
        server.await.unwrap();
    }

    #[tokio::test]
    async fn streamed_bodies_are_cut_off_at_the_limit() {
        let mut response = String::from("HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n");
        for _ in 0..4 {
            response.push_str("8\r\n01234567\r\n");
        }
        response.push_str("0\r\n\r\n");
        let (url, server) = serve_raw(response).await;

        let err = limited_transport(20)
            .send(TransportRequest::get(&url))
            .await
            .unwrap_err();

        assert_eq!(err, TransportError::BodyTooLarge { limit: 20 });
        server.await.unwrap();
    }

    #[tokio::test]
    async fn bodies_within_the_limit_are_returned_whole() {
        let (url, server) = serve_once("200 OK", "0123456789abcdef").await;

        let response = limited_transport(16)
            .send(TransportRequest::get(&url))
            .await
            .unwrap();

        assert_eq!(response.body, b"0123456789abcdef");
        server.await.unwrap();
    }

    #[test]
    fn invalid_user_agents_are_rejected() {
        let config = TransportConfig {
            user_agent: "bad\nagent".into(),
            ..TransportConfig::default()
        };
        assert!(matches!(
            ReqwestTransport::new(&config),
            Err(TransportBuildError::UserAgent(_))
        ));
    }
}
