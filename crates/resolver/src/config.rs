//! Resolver configuration.
//!
//! [`ResolverConfig`] is built once at startup (defaults, optionally overlaid by
//! a TOML file and command-line flags in the `cli` crate), validated, and then
//! handed by reference to [`crate::TokenResolver::new`]. Nothing mutates it
//! afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BlockTag, ContractAddress, Endpoint, ResolveError};

/// Scheme prefix of content-addressed references.
pub const IPFS_SCHEME: &str = "ipfs://";

/// Default contract: the Normies collection on Ethereum mainnet.
pub const DEFAULT_CONTRACT: &str = "0x9eb6e2025b64f340691e424b7fe7022ffde12438";

/// Default public RPC endpoints, in failover priority order.
pub const DEFAULT_ENDPOINTS: [&str; 4] = [
    "https://cloudflare-eth.com",
    "https://rpc.ankr.com/eth",
    "https://ethereum.publicnode.com",
    "https://1rpc.io/eth",
];

/// Default IPFS gateway prefix.
pub const DEFAULT_IPFS_GATEWAY: &str = "https://cloudflare-ipfs.com/ipfs/";

/// Default collection name, used to synthesise `"<name> #<id>"`.
pub const DEFAULT_COLLECTION_NAME: &str = "Normie";

const DEFAULT_ENDPOINT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 15;

// ---------------------------------------------------------------------------
// IPFS gateway
// ---------------------------------------------------------------------------

/// A public IPFS gateway URL prefix such as `https://cloudflare-ipfs.com/ipfs/`.
///
/// Always ends with `/`, so a CID can be appended directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpfsGateway(String);

impl IpfsGateway {
    /// Creates a gateway prefix, appending a trailing `/` if missing.
    ///
    /// Returns `None` if `prefix` is empty.
    pub fn new(prefix: impl Into<String>) -> Option<Self> {
        let mut prefix = prefix.into();
        if prefix.is_empty() {
            return None;
        }
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Some(Self(prefix))
    }

    /// Returns the gateway prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the gateway URL serving `cid`.
    pub fn url_for(&self, cid: &str) -> String {
        format!("{}{}", self.0, cid)
    }

    /// Rewrites an `ipfs://<cid>` reference to its gateway URL.
    ///
    /// Returns `None` for references using any other scheme.
    pub fn resolve_reference(&self, reference: &str) -> Option<String> {
        reference
            .strip_prefix(IPFS_SCHEME)
            .map(|cid| self.url_for(cid))
    }
}

impl TryFrom<String> for IpfsGateway {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "IPFS gateway must not be empty".to_string())
    }
}

impl From<IpfsGateway> for String {
    fn from(value: IpfsGateway) -> Self {
        value.0
    }
}

impl Default for IpfsGateway {
    fn default() -> Self {
        Self(DEFAULT_IPFS_GATEWAY.to_string())
    }
}

impl std::fmt::Display for IpfsGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Resolver configuration
// ---------------------------------------------------------------------------

/// Process-wide, read-only settings for a [`crate::TokenResolver`].
///
/// Missing fields in a deserialised document take their defaults, so a TOML
/// file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Contract exposing `tokenURI(uint256)`.
    pub contract: ContractAddress,

    /// Block selector for `eth_call`.
    pub block_tag: BlockTag,

    /// JSON-RPC endpoints; list order is failover priority.
    pub endpoints: Vec<Endpoint>,

    /// Gateway used for `ipfs://` metadata and image references.
    pub ipfs_gateway: IpfsGateway,

    /// Collection name used when a document has no `name`.
    pub collection_name: String,

    /// Upper bound on a single endpoint attempt, in seconds.
    pub endpoint_timeout_secs: u64,

    /// Upper bound on a metadata document fetch, in seconds.
    pub metadata_timeout_secs: u64,
}

impl ResolverConfig {
    /// Per-endpoint attempt timeout.
    pub fn endpoint_timeout(&self) -> Duration {
        Duration::from_secs(self.endpoint_timeout_secs)
    }

    /// Metadata fetch timeout.
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    /// Checks the invariants a resolver relies on.
    ///
    /// Deserialisation can produce empty strings that the identifier
    /// constructors would have refused, so every such field is re-checked here.
    pub fn validate(&self) -> Result<(), ResolveError> {
        let fail = |message: &str| {
            Err(ResolveError::Configuration {
                message: message.to_string(),
            })
        };

        if self.endpoints.is_empty() {
            return fail("at least one RPC endpoint is required");
        }
        if self.endpoints.iter().any(|e| e.as_str().is_empty()) {
            return fail("RPC endpoints must not be empty");
        }
        if self.contract.as_str().is_empty() {
            return fail("contract address must not be empty");
        }
        if self.block_tag.as_str().is_empty() {
            return fail("block tag must not be empty");
        }
        if self.collection_name.trim().is_empty() {
            return fail("collection name must not be empty");
        }
        if self.endpoint_timeout_secs == 0 {
            return fail("endpoint timeout must be at least one second");
        }
        if self.metadata_timeout_secs == 0 {
            return fail("metadata timeout must be at least one second");
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            contract: ContractAddress::default(),
            block_tag: BlockTag::latest(),
            endpoints: DEFAULT_ENDPOINTS
                .iter()
                .filter_map(|url| Endpoint::new(*url))
                .collect(),
            ipfs_gateway: IpfsGateway::default(),
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            endpoint_timeout_secs: DEFAULT_ENDPOINT_TIMEOUT_SECS,
            metadata_timeout_secs: DEFAULT_METADATA_TIMEOUT_SECS,
        }
    }
}
