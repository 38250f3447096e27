use base64::Engine;
use std::fmt;

use crate::validation::ValidationError;

/// Size in bytes of every Merkle tree hash (SHA-256).
pub const HASH_SIZE: usize = 32;

/// A 32-byte Merkle tree hash: a checkpoint root or a proof node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeHash([u8; HASH_SIZE]);

impl TreeHash {
    /// Wraps raw hash bytes.
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a hash from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| ValidationError::BadLength {
            field: "tree hash",
            expected: HASH_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Decodes a standard (padded) base64 hash, as carried in checkpoint bodies.
    pub fn from_base64(b64: &str) -> Result<Self, ValidationError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|_| ValidationError::PatternMismatch {
                field: "tree hash",
                value: b64.to_string(),
            })?;
        Self::from_slice(&bytes)
    }

    /// Standard base64 encoding of the hash.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }

    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl fmt::Debug for TreeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeHash({})", hex::encode(self.0))
    }
}

impl fmt::Display for TreeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl AsRef<[u8]> for TreeHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
