//! Error types for the resolution pipeline.
//!
//! [`ResolveError`] is the top-level error: every failure that terminates a
//! resolution is converted into one of its variants. Component-level errors
//! ([`EncodeError`], [`AllEndpointsFailed`], [`MetadataError`]) are defined here
//! too so the orchestrator and adapters share one vocabulary.
//!
//! Conditions with a well-defined "nothing found" meaning (an undecodable call
//! result, a missing attribute) are modelled as `Option` by the components and
//! never appear here, except where the pipeline genuinely cannot continue
//! ([`ResolveError::MissingTokenUri`]).

use std::time::Duration;

use thiserror::Error;

use crate::{Endpoint, TokenId, TransportError};

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// A token identifier could not be represented as an ABI `uint256`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The identifier is below zero.
    #[error("token id {value} is negative")]
    Negative {
        /// The rejected input, verbatim.
        value: String,
    },

    /// The identifier does not fit in 256 bits.
    #[error("token id {value} does not fit in 256 bits")]
    OutOfRange {
        /// The rejected input, verbatim.
        value: String,
    },

    /// The input is not a base-10 integer.
    #[error("token id {value:?} is not a base-10 integer")]
    InvalidDigits {
        /// The rejected input, verbatim.
        value: String,
    },
}

// ---------------------------------------------------------------------------
// RPC failover
// ---------------------------------------------------------------------------

/// Why a single endpoint attempt did not produce a usable result.
#[derive(Debug, Error)]
pub enum EndpointFailureCause {
    /// The transport could not complete the exchange.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The attempt did not finish within the per-endpoint timeout.
    #[error("timed out after {}ms", .after.as_millis())]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },

    /// The endpoint answered with a non-2xx HTTP status.
    #[error("HTTP status {status}")]
    HttpStatus {
        /// The status code received.
        status: u16,
    },

    /// The endpoint answered with a JSON-RPC `error` object.
    #[error("RPC error{}: {message}", .code.map(|c| format!(" {c}")).unwrap_or_default())]
    Rpc {
        /// The JSON-RPC error code, if the endpoint supplied one.
        code: Option<i64>,
        /// The JSON-RPC error message.
        message: String,
    },

    /// The body was not a JSON-RPC response carrying a `result`.
    #[error("malformed response: {detail}")]
    MalformedResponse {
        /// What was wrong with the body.
        detail: String,
    },
}

/// One failed endpoint attempt.
#[derive(Debug, Error)]
#[error("{endpoint}: {cause}")]
pub struct EndpointFailure {
    /// The endpoint that was tried.
    pub endpoint: Endpoint,
    /// Why it failed.
    #[source]
    pub cause: EndpointFailureCause,
}

/// Every configured endpoint failed the call.
///
/// Carries each per-endpoint failure in the order the endpoints were tried.
/// The list is empty only when no endpoints were configured.
#[derive(Debug, Error)]
pub struct AllEndpointsFailed {
    failures: Vec<EndpointFailure>,
}

impl AllEndpointsFailed {
    /// Creates the error from the failures collected during one call.
    pub fn new(failures: Vec<EndpointFailure>) -> Self {
        Self { failures }
    }

    /// Every failure, in attempt order.
    pub fn failures(&self) -> &[EndpointFailure] {
        &self.failures
    }

    /// The failure from the last endpoint tried, if any endpoint was tried.
    pub fn last(&self) -> Option<&EndpointFailure> {
        self.failures.last()
    }
}

impl std::fmt::Display for AllEndpointsFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.last() {
            Some(last) => write!(
                f,
                "all {} RPC endpoints failed; last error: {}",
                self.failures.len(),
                last
            ),
            None => write!(f, "all RPC endpoints failed: no endpoints configured"),
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Why a network fetch of a metadata document failed.
#[derive(Debug, Error)]
pub enum FetchFailureCause {
    /// The transport could not complete the exchange.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The fetch did not finish within the metadata timeout.
    #[error("timed out after {}ms", .after.as_millis())]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },

    /// The server answered with a non-2xx HTTP status.
    #[error("HTTP status {status}")]
    HttpStatus {
        /// The status code received.
        status: u16,
    },
}

/// The metadata document could not be retrieved from the network.
#[derive(Debug, Error)]
#[error("failed to fetch metadata from {url}: {cause}")]
pub struct MetadataFetchError {
    /// The URL that was requested (gateway URL for IPFS references).
    pub url: String,
    /// Why the fetch failed.
    #[source]
    pub cause: FetchFailureCause,
}

/// The metadata document was retrieved (or embedded) but is not valid JSON.
#[derive(Debug, Error)]
pub enum MetadataParseError {
    /// The payload of a `data:application/json;base64,` URI is not base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload of a `data:application/json,` URI is not valid
    /// percent-encoded UTF-8.
    #[error("invalid percent-encoded payload: {0}")]
    PercentEncoding(#[from] std::string::FromUtf8Error),

    /// The document body is not JSON.
    #[error("metadata is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of [`crate::MetadataResolver::fetch`].
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The document could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] MetadataFetchError),

    /// The document could not be parsed.
    #[error(transparent)]
    Parse(#[from] MetadataParseError),
}

// ---------------------------------------------------------------------------
// Resolution-level errors
// ---------------------------------------------------------------------------

/// Errors that terminate a resolution request.
///
/// The caller (the CLI, or any request handler embedding this crate) maps these
/// to a user-visible failure; nothing here is retried beyond the endpoint
/// failover already performed by [`crate::RpcFailoverClient`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The token identifier cannot be ABI-encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The `tokenURI` call failed against every endpoint.
    #[error(transparent)]
    Rpc(#[from] AllEndpointsFailed),

    /// The call succeeded but returned no usable URI (nonexistent token,
    /// reverted-to-empty data, or an empty string).
    #[error("Empty tokenURI for token {token_id}")]
    MissingTokenUri {
        /// The token that was looked up.
        token_id: TokenId,
    },

    /// The metadata document could not be fetched or parsed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// The resolver configuration is invalid.
    ///
    /// Produced at load time; a resolver is never built from an invalid config.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}
