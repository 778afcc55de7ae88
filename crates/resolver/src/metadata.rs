//! Token URI classification and metadata document retrieval.
//!
//! A token URI is classified once into a [`UriScheme`]; [`MetadataResolver`]
//! then handles each scheme exhaustively. Embedded (`data:`) documents never
//! touch the network.

use std::sync::Arc;
use std::time::Duration;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use tracing::debug;

use crate::{
    FetchFailureCause, IpfsGateway, MetadataDocument, MetadataError, MetadataFetchError,
    MetadataParseError, Transport, TransportRequest, IPFS_SCHEME,
};

const BASE64_JSON_PREFIX: &str = "data:application/json;base64,";
const PERCENT_JSON_PREFIX: &str = "data:application/json,";

/// Standard alphabet; padding optional and trailing bits ignored on decode.
const EMBEDDED_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// How a token URI designates its metadata document.
///
/// Borrowed payloads point into the original URI with the prefix removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriScheme<'a> {
    /// `data:application/json;base64,<payload>`
    Base64Json(&'a str),
    /// `data:application/json,<percent-encoded payload>`
    PercentJson(&'a str),
    /// `ipfs://<cid>`
    Ipfs(&'a str),
    /// Anything else, fetched as-is.
    Url(&'a str),
}

impl<'a> UriScheme<'a> {
    /// Classifies `uri` by prefix. The base64 prefix is checked before the
    /// plain `data:application/json,` prefix.
    pub fn classify(uri: &'a str) -> Self {
        if let Some(payload) = uri.strip_prefix(BASE64_JSON_PREFIX) {
            Self::Base64Json(payload)
        } else if let Some(payload) = uri.strip_prefix(PERCENT_JSON_PREFIX) {
            Self::PercentJson(payload)
        } else if let Some(cid) = uri.strip_prefix(IPFS_SCHEME) {
            Self::Ipfs(cid)
        } else {
            Self::Url(uri)
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Base64Json(_) => "base64-json",
            Self::PercentJson(_) => "percent-json",
            Self::Ipfs(_) => "ipfs",
            Self::Url(_) => "url",
        }
    }
}

/// Turns token URIs into parsed metadata documents.
#[derive(Clone)]
pub struct MetadataResolver {
    transport: Arc<dyn Transport>,
    gateway: IpfsGateway,
    fetch_timeout: Duration,
}

impl MetadataResolver {
    /// Creates a resolver that fetches IPFS documents through `gateway`.
    pub fn new(transport: Arc<dyn Transport>, gateway: IpfsGateway, fetch_timeout: Duration) -> Self {
        Self {
            transport,
            gateway,
            fetch_timeout,
        }
    }

    /// Retrieves and parses the document `uri` designates.
    ///
    /// Network-addressed documents are fetched once, without retry or gateway
    /// failover.
    pub async fn fetch(&self, uri: &str) -> Result<MetadataDocument, MetadataError> {
        let scheme = UriScheme::classify(uri);
        debug!(scheme = scheme.kind(), "resolving token URI");

        match scheme {
            UriScheme::Base64Json(payload) => {
                let bytes = EMBEDDED_BASE64
                    .decode(payload.trim())
                    .map_err(MetadataParseError::from)?;
                parse_document(&bytes)
            }
            UriScheme::PercentJson(payload) => {
                let text = urlencoding::decode(payload).map_err(MetadataParseError::from)?;
                parse_document(text.as_bytes())
            }
            UriScheme::Ipfs(cid) => self.fetch_json(&self.gateway.url_for(cid)).await,
            UriScheme::Url(url) => self.fetch_json(url).await,
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<MetadataDocument, MetadataError> {
        let fetch_error = |cause| MetadataFetchError {
            url: url.to_string(),
            cause,
        };

        let response = tokio::time::timeout(
            self.fetch_timeout,
            self.transport.send(TransportRequest::get(url)),
        )
        .await
        .map_err(|_| {
            fetch_error(FetchFailureCause::Timeout {
                after: self.fetch_timeout,
            })
        })?
        .map_err(|e| fetch_error(FetchFailureCause::Transport(e)))?;

        if !response.is_success() {
            return Err(fetch_error(FetchFailureCause::HttpStatus {
                status: response.status,
            })
            .into());
        }

        debug!(url, bytes = response.body.len(), "fetched metadata document");
        parse_document(&response.body)
    }
}

impl std::fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataResolver")
            .field("gateway", &self.gateway)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

fn parse_document(bytes: &[u8]) -> Result<MetadataDocument, MetadataError> {
    let value = serde_json::from_slice(bytes).map_err(MetadataParseError::from)?;
    Ok(MetadataDocument::new(value))
}
