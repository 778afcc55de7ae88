//! Attribute lookup and image normalisation over metadata documents.
//!
//! Producers disagree on naming: the attribute list may be `attributes` or
//! `traits`, an entry's label may be `trait_type` or `key`, and labels vary in
//! case and spacing (`"Pixel Count"`, `"pixel_count"`, `"PixelCount"`). Matching
//! goes through [`normalize_label`] on both sides.

use serde_json::Value;

use crate::{ExtractedTraits, IpfsGateway, MetadataDocument};

/// Label of the attribute this resolver reports.
pub const PIXEL_COUNT_LABEL: &str = "Pixel Count";

const ATTRIBUTE_LIST_FIELDS: [&str; 2] = ["attributes", "traits"];
const LABEL_FIELDS: [&str; 2] = ["trait_type", "key"];
const IMAGE_FIELDS: [&str; 2] = ["image", "image_url"];

static NULL: Value = Value::Null;

/// Lower-cases `label` and removes whitespace and underscores.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// One entry of a document's attribute list.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute<'a> {
    /// The entry's label (`trait_type`, else `key`).
    pub label: &'a str,
    /// The entry's raw value; usually a string or number.
    pub value: &'a Value,
}

impl<'a> Attribute<'a> {
    /// Reads an attribute from a list entry.
    ///
    /// Returns `None` for entries that are not objects or carry no non-empty
    /// string label.
    pub fn from_entry(entry: &'a Value) -> Option<Self> {
        let fields = entry.as_object()?;
        let label = LABEL_FIELDS
            .iter()
            .filter_map(|name| fields.get(*name).and_then(Value::as_str))
            .find(|label| !label.is_empty())?;
        Some(Self {
            label,
            value: fields.get("value").unwrap_or(&NULL),
        })
    }

    /// Parses the value as a base-10 integer.
    ///
    /// Strings are read like JavaScript's `parseInt(s, 10)`: leading whitespace
    /// and an optional sign, then the longest digit run, so `"42px"` is `42`.
    /// Numbers are truncated toward zero. Anything else is `None`.
    pub fn integer_value(&self) -> Option<i64> {
        match self.value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }),
            Value::String(s) => parse_int_prefix(s),
            _ => None,
        }
    }
}

fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let magnitude: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Pulls the Pixel Count trait and image URL out of a metadata document.
///
/// Extraction never fails; anything missing or malformed comes back as `None`
/// or an empty string.
#[derive(Debug, Clone)]
pub struct TraitExtractor {
    gateway: IpfsGateway,
    target: String,
}

impl TraitExtractor {
    /// Creates an extractor that rewrites `ipfs://` images through `gateway`.
    pub fn new(gateway: IpfsGateway) -> Self {
        Self {
            gateway,
            target: normalize_label(PIXEL_COUNT_LABEL),
        }
    }

    /// Extracts the pixel count and image URL from `doc`.
    ///
    /// Only the first entry whose label matches is considered; if its value is
    /// not numeric the pixel count is `None`, exactly as if it were missing.
    pub fn extract(&self, doc: &MetadataDocument) -> ExtractedTraits {
        let pixel_count = self
            .find_target(doc)
            .and_then(|attribute| attribute.integer_value());

        let image_url = match doc.first_non_empty_str(&IMAGE_FIELDS) {
            Some(reference) => self
                .gateway
                .resolve_reference(reference)
                .unwrap_or_else(|| reference.to_string()),
            None => String::new(),
        };

        ExtractedTraits {
            pixel_count,
            image_url,
        }
    }

    fn find_target<'a>(&self, doc: &'a MetadataDocument) -> Option<Attribute<'a>> {
        doc.first_present(&ATTRIBUTE_LIST_FIELDS)
            .and_then(Value::as_array)?
            .iter()
            .filter_map(Attribute::from_entry)
            .find(|attribute| normalize_label(attribute.label) == self.target)
    }
}
