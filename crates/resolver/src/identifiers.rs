//! Newtype domain identifiers.
//!
//! Every configured location and every identity that flows through a resolution
//! is a distinct newtype. This prevents accidentally passing, for example, an
//! [`Endpoint`] where a [`ContractAddress`] is expected even though both are
//! strings under the hood.

use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::errors::EncodeError;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (configuration)
// ---------------------------------------------------------------------------

string_id! {
    /// A JSON-RPC endpoint URL (e.g. `"https://cloudflare-eth.com"`).
    ///
    /// Endpoints carry no identity beyond their location; their position in the
    /// configured list defines failover priority.
    Endpoint
}

string_id! {
    /// The `0x`-prefixed address of the contract exposing `tokenURI(uint256)`.
    ///
    /// Not validated beyond being non-empty.
    ContractAddress
}

string_id! {
    /// The block selector passed as the second `eth_call` parameter.
    ///
    /// Always `"latest"` in the default configuration.
    BlockTag
}

impl Default for ContractAddress {
    fn default() -> Self {
        Self(crate::config::DEFAULT_CONTRACT.to_string())
    }
}

impl BlockTag {
    /// The tag meaning "most recent confirmed state".
    pub fn latest() -> Self {
        Self("latest".to_string())
    }
}

impl Default for BlockTag {
    fn default() -> Self {
        Self::latest()
    }
}

// ---------------------------------------------------------------------------
// Identifiers: uint256-backed (on-chain)
// ---------------------------------------------------------------------------

/// The non-negative integer naming one token in the collection.
///
/// Any value below `2^256` is representable. Construction from signed or
/// textual input is fallible and reports an [`EncodeError`]; once built, a
/// [`TokenId`] can always be encoded into a call payload.
///
/// Serialises as a JSON number when it fits in a `u64`, otherwise as a decimal
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(U256);

impl TokenId {
    /// Creates a [`TokenId`] from an unsigned integer.
    pub fn new(value: u64) -> Self {
        Self(U256::from(value))
    }

    /// Creates a [`TokenId`] from a signed integer.
    ///
    /// Returns [`EncodeError::Negative`] for values below zero.
    pub fn from_signed(value: i128) -> Result<Self, EncodeError> {
        u128::try_from(value)
            .map(|v| Self(U256::from(v)))
            .map_err(|_| EncodeError::Negative {
                value: value.to_string(),
            })
    }

    /// Parses a base-10 integer string of arbitrary length.
    ///
    /// Leading and trailing whitespace is ignored. Fails with
    /// [`EncodeError::Negative`] for a leading minus sign,
    /// [`EncodeError::InvalidDigits`] for anything that is not a digit run, and
    /// [`EncodeError::OutOfRange`] for values of `2^256` or more.
    pub fn from_decimal(text: &str) -> Result<Self, EncodeError> {
        let trimmed = text.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

        if let Some(magnitude) = digits.strip_prefix('-') {
            if is_digit_run(magnitude) {
                return Err(EncodeError::Negative {
                    value: trimmed.to_string(),
                });
            }
        }
        if !is_digit_run(digits) {
            return Err(EncodeError::InvalidDigits {
                value: trimmed.to_string(),
            });
        }

        U256::from_str_radix(digits, 10)
            .map(Self)
            .map_err(|_| EncodeError::OutOfRange {
                value: trimmed.to_string(),
            })
    }

    /// Returns the underlying 256-bit value.
    pub fn as_u256(self) -> U256 {
        self.0
    }

    /// Returns the value as a `u64` if it fits.
    pub fn as_u64(self) -> Option<u64> {
        let limbs = self.0.as_limbs();
        if limbs[1..].iter().all(|limb| *limb == 0) {
            Some(limbs[0])
        } else {
            None
        }
    }

    /// Returns the 32-byte big-endian representation used in ABI encoding.
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }
}

fn is_digit_run(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

impl From<u64> for TokenId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl FromStr for TokenId {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal(s)
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_u64() {
            Some(v) => serializer.serialize_u64(v),
            None => serializer.collect_str(self),
        }
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single resolution (one call to `TokenResolver::resolve`).
///
/// Generated fresh for every resolution and recorded on its tracing span so all
/// activity from a single request can be correlated across endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionId(Uuid);

impl ResolutionId {
    /// Generates a new random resolution identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ResolutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
