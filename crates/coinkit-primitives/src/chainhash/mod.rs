//! Transaction hash type.
//!
//! `TxHash` is a 32-byte double-SHA-256 digest stored in internal
//! (little-endian) byte order and displayed byte-reversed, the way block
//! explorers print transaction IDs. Outpoints reference previous
//! transactions through it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Size of a TxHash in bytes.
pub const HASH_SIZE: usize = 32;

/// A 32-byte transaction hash.
///
/// The bytes are kept exactly as they appear on the wire; only the
/// `Display`/`FromStr` forms reverse them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct TxHash([u8; HASH_SIZE]);

impl TxHash {
    /// Wrap 32 bytes given in internal (wire) order.
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        TxHash(bytes)
    }

    /// Build a hash from a slice that must be exactly 32 bytes long.
    ///
    /// # Arguments
    /// * `bytes` - Bytes in internal order.
    ///
    /// # Returns
    /// `Ok(TxHash)`, or `InvalidHash` when the length is wrong.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| {
            PrimitivesError::InvalidHash(format!(
                "invalid hash length of {}, want {}",
                bytes.len(),
                HASH_SIZE
            ))
        })?;
        Ok(TxHash(arr))
    }

    /// Parse a 64-character hex string in display (reversed) order.
    ///
    /// # Arguments
    /// * `hex_str` - The hash as printed by explorers.
    ///
    /// # Returns
    /// `Ok(TxHash)` holding the bytes in internal order.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let mut decoded = hex::decode(hex_str)?;
        decoded.reverse();
        Self::from_slice(&decoded)
    }

    /// The double-SHA-256 of `data`, e.g. the ID of a serialized transaction.
    pub fn hash_of(data: &[u8]) -> Self {
        TxHash(sha256d(data))
    }

    /// Access the internal byte array.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// True for the all-zero hash used by coinbase inputs.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}

impl FromStr for TxHash {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TxHash::from_hex(s)
    }
}

impl From<[u8; HASH_SIZE]> for TxHash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        TxHash(bytes)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TxHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
