//! The end-to-end resolution pipeline.
//!
//! `encode_call` → [`RpcFailoverClient::eth_call`] → `decode_string` →
//! [`MetadataResolver::fetch`] → [`TraitExtractor::extract`], run sequentially
//! inside one tracing span per token.

use std::sync::Arc;

use tracing::{info, Instrument};

use crate::{
    decode_string, encode_call, BlockTag, CallRequest, ContractAddress, MetadataResolver,
    ResolutionId, ResolutionResult, ResolveError, ResolverConfig, RpcFailoverClient, TokenId,
    TraitExtractor, Transport,
};

/// Resolves token identifiers into [`ResolutionResult`]s.
///
/// Holds only immutable configuration and a shared transport, so one instance
/// can serve any number of concurrent resolutions. Dropping the future
/// returned by [`TokenResolver::resolve`] cancels the in-flight request.
#[derive(Debug, Clone)]
pub struct TokenResolver {
    contract: ContractAddress,
    block_tag: BlockTag,
    collection_name: String,
    rpc: RpcFailoverClient,
    metadata: MetadataResolver,
    extractor: TraitExtractor,
}

impl TokenResolver {
    /// Builds a resolver from a validated configuration.
    ///
    /// Fails with [`ResolveError::Configuration`] if `config` does not pass
    /// [`ResolverConfig::validate`].
    pub fn new(config: &ResolverConfig, transport: Arc<dyn Transport>) -> Result<Self, ResolveError> {
        config.validate()?;

        Ok(Self {
            contract: config.contract.clone(),
            block_tag: config.block_tag.clone(),
            collection_name: config.collection_name.clone(),
            rpc: RpcFailoverClient::new(
                Arc::clone(&transport),
                config.endpoints.clone(),
                config.endpoint_timeout(),
            ),
            metadata: MetadataResolver::new(
                transport,
                config.ipfs_gateway.clone(),
                config.metadata_timeout(),
            ),
            extractor: TraitExtractor::new(config.ipfs_gateway.clone()),
        })
    }

    /// Looks up `token_id` on chain and returns its normalised metadata.
    pub async fn resolve(&self, token_id: TokenId) -> Result<ResolutionResult, ResolveError> {
        let resolution_id = ResolutionId::new_random();
        let span = tracing::info_span!(
            "resolve_token",
            token_id = %token_id,
            resolution_id = %resolution_id,
        );
        self.resolve_inner(token_id).instrument(span).await
    }

    async fn resolve_inner(&self, token_id: TokenId) -> Result<ResolutionResult, ResolveError> {
        let request = CallRequest {
            to: self.contract.clone(),
            data: encode_call(token_id),
            block: self.block_tag.clone(),
        };

        let raw = self.rpc.eth_call(&request).await?;
        let token_uri = raw
            .as_str()
            .and_then(decode_string)
            .filter(|uri| !uri.is_empty())
            .ok_or(ResolveError::MissingTokenUri { token_id })?;

        let document = self.metadata.fetch(&token_uri).await?;
        let traits = self.extractor.extract(&document);

        let name = document
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} #{}", self.collection_name, token_id));

        info!(
            pixel_count = ?traits.pixel_count,
            has_image = !traits.image_url.is_empty(),
            "token resolved"
        );

        Ok(ResolutionResult {
            id: token_id,
            name,
            pixel_count: traits.pixel_count,
            image_url: traits.image_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{Endpoint, TransportError, TransportRequest, TransportResponse};

    /// Serves `eth_call` results from one RPC URL and documents from any other.
    struct Chain {
        result: serde_json::Value,
        document: String,
    }

    #[async_trait]
    impl Transport for Chain {
        async fn send(
            &self,
            request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            let body = if request.url == "https://rpc.test" {
                json!({"jsonrpc": "2.0", "id": 1, "result": self.result}).to_string()
            } else {
                self.document.clone()
            };
            Ok(TransportResponse::new(200, body.into_bytes()))
        }
    }

    fn resolver(result: serde_json::Value, document: &str) -> TokenResolver {
        let config = ResolverConfig {
            endpoints: vec![Endpoint::new("https://rpc.test").unwrap()],
            ..ResolverConfig::default()
        };
        let transport = Arc::new(Chain {
            result,
            document: document.to_string(),
        });
        TokenResolver::new(&config, transport).unwrap()
    }

    fn abi_string(s: &str) -> String {
        let mut hex = format!("{:064x}{:064x}", 32, s.len());
        hex.push_str(&hex::encode(s));
        while hex.len() % 64 != 0 {
            hex.push('0');
        }
        format!("0x{hex}")
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = ResolverConfig {
            endpoints: Vec::new(),
            ..ResolverConfig::default()
        };
        let transport = Arc::new(Chain {
            result: json!("0x"),
            document: String::new(),
        });
        assert!(matches!(
            TokenResolver::new(&config, transport),
            Err(ResolveError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn empty_chain_output_is_a_missing_token_uri() {
        let err = resolver(json!("0x"), "{}")
            .resolve(TokenId::new(3))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingTokenUri { .. }));
    }

    #[tokio::test]
    async fn zero_length_uri_is_a_missing_token_uri() {
        let err = resolver(json!(format!("0x{}", "0".repeat(128))), "{}")
            .resolve(TokenId::new(3))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingTokenUri { .. }));
    }

    #[tokio::test]
    async fn non_string_results_are_a_missing_token_uri() {
        let err = resolver(json!({"unexpected": true}), "{}")
            .resolve(TokenId::new(3))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingTokenUri { .. }));
    }

    #[tokio::test]
    async fn name_falls_back_to_the_collection_name() {
        let result = resolver(json!(abi_string("https://meta.test/8")), r#"{"name": ""}"#)
            .resolve(TokenId::new(8))
            .await
            .unwrap();

        assert_eq!(result.id, TokenId::new(8));
        assert_eq!(result.name, "Normie #8");
        assert_eq!(result.pixel_count, None);
        assert_eq!(result.image_url, "");
    }

    #[tokio::test]
    async fn unparseable_documents_propagate_as_metadata_errors() {
        let err = resolver(json!(abi_string("https://meta.test/8")), "not json")
            .resolve(TokenId::new(8))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Metadata(_)));
    }
}
