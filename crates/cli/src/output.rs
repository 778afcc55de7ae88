//! Public token-id validation and the JSON records written to stdout.

use resolver::TokenId;
use serde::Serialize;
use thiserror::Error;

/// Highest token id accepted from the command line.
pub const MAX_PUBLIC_TOKEN_ID: u64 = 9999;

/// The command-line id was not an integer in `0..=9999`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid token ID (0\u{2013}9999)")]
pub struct InvalidTokenId;

/// Parses a command-line token id, accepting only decimal integers in
/// `0..=MAX_PUBLIC_TOKEN_ID`.
pub fn parse_public_id(raw: &str) -> Result<TokenId, InvalidTokenId> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidTokenId);
    }
    match raw.parse::<u64>() {
        Ok(id) if id <= MAX_PUBLIC_TOKEN_ID => Ok(TokenId::new(id)),
        _ => Err(InvalidTokenId),
    }
}

/// `{"error": "..."}` record printed when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorRecord {
    pub error: String,
}

impl ErrorRecord {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// Renders `value` as pretty-printed JSON.
pub fn render<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
