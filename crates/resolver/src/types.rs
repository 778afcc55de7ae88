//! Shared value types for the resolution pipeline.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! the data that moves between pipeline stages: the call payload, the
//! `eth_call` request built from it, the fetched metadata document, and the
//! final [`ResolutionResult`].

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::{BlockTag, ContractAddress, TokenId};

// ---------------------------------------------------------------------------
// Call payload and request
// ---------------------------------------------------------------------------

/// ABI-encoded input for a contract call (selector followed by arguments).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallData(Vec<u8>);

impl CallData {
    /// Wraps raw payload bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the payload as a `0x`-prefixed lowercase hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl std::fmt::Display for CallData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

// ---------------------------------------------------------------------------

/// A read-only `eth_call` against one contract at one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Target contract.
    pub to: ContractAddress,
    /// Encoded call input.
    pub data: CallData,
    /// Block selector.
    pub block: BlockTag,
}

impl CallRequest {
    /// JSON-RPC `params` for `eth_call`: `[{to, data}, block]`.
    pub fn to_params(&self) -> Vec<Value> {
        vec![
            json!({ "to": self.to.as_str(), "data": self.data.to_hex() }),
            Value::String(self.block.as_str().to_string()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Metadata document
// ---------------------------------------------------------------------------

/// An unstructured token metadata document.
///
/// Producers disagree on field names and shapes, so the document is kept as raw
/// JSON and read through tolerant accessors. A document whose top level is not
/// a JSON object simply has no fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataDocument(Value);

impl MetadataDocument {
    /// Wraps a parsed JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the document's top-level fields, if it is an object.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    /// Returns the first of `names` that is present and not `null`.
    pub fn first_present(&self, names: &[&str]) -> Option<&Value> {
        let fields = self.fields()?;
        names
            .iter()
            .filter_map(|name| fields.get(*name))
            .find(|value| !value.is_null())
    }

    /// Returns the first of `names` that holds a non-empty string.
    pub fn first_non_empty_str(&self, names: &[&str]) -> Option<&str> {
        let fields = self.fields()?;
        names
            .iter()
            .filter_map(|name| fields.get(*name).and_then(Value::as_str))
            .find(|s| !s.is_empty())
    }

    /// The document's `name`, when it is a non-empty string.
    pub fn name(&self) -> Option<&str> {
        self.first_non_empty_str(&["name"])
    }

    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Extraction and resolution results
// ---------------------------------------------------------------------------

/// What [`crate::TraitExtractor::extract`] finds in a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedTraits {
    /// Parsed pixel count; `None` when the attribute is missing or not numeric.
    pub pixel_count: Option<i64>,
    /// Image URL with IPFS references rewritten to the gateway; `""` if absent.
    pub image_url: String,
}

/// The final, human-usable record for one token.
///
/// `id` always equals the requested identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    /// The requested token identifier.
    pub id: TokenId,
    /// Document name, or `"<collection> #<id>"` when the document has none.
    pub name: String,
    /// Pixel Count trait value, serialised as `null` when unknown.
    pub pixel_count: Option<i64>,
    /// Image location.
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_request_params_follow_the_eth_call_shape() {
        let request = CallRequest {
            to: ContractAddress::new("0xabc").unwrap(),
            data: CallData::new(vec![0xc8, 0x7b, 0x56, 0xdd]),
            block: BlockTag::latest(),
        };

        assert_eq!(
            request.to_params(),
            vec![json!({"to": "0xabc", "data": "0xc87b56dd"}), json!("latest")]
        );
    }

    #[test]
    fn first_present_skips_missing_and_null_fields() {
        let doc = MetadataDocument::new(json!({"attributes": null, "traits": [1]}));
        assert_eq!(
            doc.first_present(&["attributes", "traits"]),
            Some(&json!([1]))
        );
        assert_eq!(doc.first_present(&["missing"]), None);
    }

    #[test]
    fn first_non_empty_str_falls_through_empty_strings() {
        let doc = MetadataDocument::new(json!({"image": "", "image_url": "https://x/1.png"}));
        assert_eq!(
            doc.first_non_empty_str(&["image", "image_url"]),
            Some("https://x/1.png")
        );
    }

    #[test]
    fn non_object_documents_have_no_fields() {
        let doc = MetadataDocument::new(json!(["not", "an", "object"]));
        assert!(doc.fields().is_none());
        assert_eq!(doc.name(), None);
    }

    #[test]
    fn resolution_result_uses_camel_case_and_null_pixel_count() {
        let result = ResolutionResult {
            id: TokenId::new(5),
            name: "Normie #5".into(),
            pixel_count: None,
            image_url: String::new(),
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"id": 5, "name": "Normie #5", "pixelCount": null, "imageUrl": ""})
        );
    }
}
