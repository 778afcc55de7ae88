//! ABI encoding for the `tokenURI(uint256)` call.
//!
//! Only the two shapes this resolver needs are supported: a call taking one
//! `uint256` argument, and a return value holding one dynamic `string`.

use crate::{CallData, TokenId};

/// `keccak256("tokenURI(uint256)")[..4]`.
pub const TOKEN_URI_SELECTOR: [u8; 4] = [0xc8, 0x7b, 0x56, 0xdd];

const WORD: usize = 32;

/// Hex characters in the offset and length words that precede string data.
const STRING_HEADER_HEX_LEN: usize = 4 * WORD;

/// Encodes a `tokenURI(token_id)` call: selector followed by the id as a
/// left-zero-padded 32-byte big-endian word.
pub fn encode_call(token_id: TokenId) -> CallData {
    let mut payload = Vec::with_capacity(TOKEN_URI_SELECTOR.len() + WORD);
    payload.extend_from_slice(&TOKEN_URI_SELECTOR);
    payload.extend_from_slice(&token_id.to_be_bytes());
    CallData::new(payload)
}

/// Decodes a single ABI dynamic `string` from hex-encoded call output.
///
/// The layout is a 32-byte offset word (skipped), a 32-byte length word `L`,
/// then `L` bytes of UTF-8 padded to a word boundary. Padding is ignored.
/// Invalid UTF-8 sequences are replaced with U+FFFD.
///
/// Returns `None`, never panicking, when the output cannot hold a string:
/// fewer than 128 hex characters after the optional `0x` prefix, non-hex
/// characters, or a length running past the end of the data. Empty output
/// (`"0x"`) is the usual answer for a token that does not exist.
pub fn decode_string(raw: &str) -> Option<String> {
    let data = raw.strip_prefix("0x").unwrap_or(raw);
    if data.len() < STRING_HEADER_HEX_LEN {
        return None;
    }

    let length_word = hex::decode(data.get(2 * WORD..STRING_HEADER_HEX_LEN)?).ok()?;
    let length = word_to_usize(&length_word)?;

    let start = STRING_HEADER_HEX_LEN;
    let end = length.checked_mul(2)?.checked_add(start)?;
    let bytes = hex::decode(data.get(start..end)?).ok()?;

    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Reads a big-endian 32-byte word as a `usize`, if it fits.
fn word_to_usize(word: &[u8]) -> Option<usize> {
    let (high, low) = word.split_at(WORD - 8);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    let low: [u8; 8] = low.try_into().ok()?;
    usize::try_from(u64::from_be_bytes(low)).ok()
}
