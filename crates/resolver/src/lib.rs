//! Core resolution domain for Normie token metadata.
//!
//! Given a token identifier, this crate reads the token's `tokenURI` from the
//! collection contract over JSON-RPC, decodes the ABI string it returns, fetches
//! the metadata document the URI designates (embedded `data:` JSON, IPFS, or
//! plain HTTP), and extracts the Pixel Count trait and image location.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no I/O of its
//! own. All network access goes through the [`Transport`] trait; infrastructure
//! crates (e.g. `fetch`) supply the implementation.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`TokenId`, `Endpoint`, `ContractAddress`, etc.) |
//! | [`types`] | Value types passed between stages (`CallRequest`, `MetadataDocument`, `ResolutionResult`) |
//! | [`errors`] | Component and top-level error types |
//! | [`config`] | `ResolverConfig` and `IpfsGateway` |
//! | [`transport`] | The `Transport` port trait |
//! | [`abi`] | `tokenURI(uint256)` call encoding and string decoding |
//! | [`rpc`] | JSON-RPC client with ordered endpoint failover |
//! | [`metadata`] | URI-scheme dispatch and document retrieval |
//! | [`attributes`] | Tolerant trait lookup and image normalisation |
//! | [`resolve`] | The `TokenResolver` pipeline |

pub mod abi;
pub mod attributes;
pub mod config;
pub mod errors;
pub mod identifiers;
pub mod metadata;
pub mod resolve;
pub mod rpc;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use abi::{decode_string, encode_call, TOKEN_URI_SELECTOR};
pub use attributes::{normalize_label, Attribute, TraitExtractor, PIXEL_COUNT_LABEL};
pub use config::{IpfsGateway, ResolverConfig, IPFS_SCHEME};
pub use errors::{
    AllEndpointsFailed, EncodeError, EndpointFailure, EndpointFailureCause, FetchFailureCause,
    MetadataError, MetadataFetchError, MetadataParseError, ResolveError,
};
pub use identifiers::{BlockTag, ContractAddress, Endpoint, ResolutionId, TokenId};
pub use metadata::{MetadataResolver, UriScheme};
pub use resolve::TokenResolver;
pub use rpc::RpcFailoverClient;
pub use transport::{HttpMethod, Transport, TransportError, TransportRequest, TransportResponse};
pub use types::{CallData, CallRequest, ExtractedTraits, MetadataDocument, ResolutionResult};
