//! Account addresses.
//!
//! An account is identified by a 20-byte address. Parsing accepts the
//! usual `0x` + 40 hex digit form; a mixed-case input must carry a
//! valid EIP-55 checksum, while all-lowercase and all-uppercase inputs
//! are accepted as-is. Equality is on the raw bytes, so comparisons
//! are case-insensitive by construction.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::CoreError;

/// A wallet account address (20 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether `input` parses as a well-formed address.
    pub fn is_valid(input: &str) -> bool {
        input.parse::<Address>().is_ok()
    }

    /// Lowercase hex form, used for cache file names and log fields.
    pub fn to_hex_lower(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 checksummed form: each hex letter is uppercased when the
    /// corresponding nibble of keccak256(lowercase hex) is >= 8.
    pub fn to_checksummed(&self) -> String {
        let body = hex::encode(self.0);
        let digest = Keccak256::digest(body.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in body.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                digest[i / 2] >> 4
            } else {
                digest[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidAddress(input.to_string());
        let body = input.strip_prefix("0x").ok_or_else(invalid)?;
        if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body.to_ascii_lowercase(), &mut bytes).map_err(|_| invalid())?;
        let address = Address(bytes);

        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower && input != address.to_checksummed() {
            return Err(invalid());
        }

        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksummed())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksummed())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksummed())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|_| {
            D::Error::custom(format!("invalid account address: {raw:?}"))
        })
    }
}
