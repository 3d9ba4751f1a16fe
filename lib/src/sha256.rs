// Import serialization traits from serde
use serde::{Deserialize, Serialize};
// Import digest function from sha256 crate for hashing
use sha256::digest;
use std::fmt;

use crate::error::{Result, SigError};

// Render the hash as lowercase hex, most significant byte first
impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A 32-byte message digest handed to `sign` and `verify`.
///
/// Signing treats it as opaque: whatever digest scheme produced it is the
/// caller's business. `hash` and `digest` are conveniences for callers that
/// want plain SHA-256.
#[derive(Hash, Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Hash([u8; 32]);

impl Hash {
    // Generic function that can hash any serializable type
    // Data is encoded as CBOR first so the digest is stable across runs
    pub fn hash<T: serde::Serialize>(data: &T) -> Result<Self> {
        let mut serialized: Vec<u8> = vec![];
        ciborium::into_writer(data, &mut serialized)
            .map_err(|e| SigError::HashingFailed(e.to_string()))?;
        Hash::digest(&serialized)
    }

    /// SHA-256 of raw bytes.
    pub fn digest(bytes: &[u8]) -> Result<Self> {
        // sha256::digest hands back lowercase hex
        let hex_digest = digest(bytes);
        let mut out = [0u8; 32];
        hex::decode_to_slice(hex_digest, &mut out)
            .map_err(|e| SigError::HashingFailed(e.to_string()))?;
        Ok(Hash(out))
    }

    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Hash(out))
    }

    // Create a Hash instance with value zero
    pub fn zero() -> Self {
        Hash([0u8; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
