// Curve primitives come from the ecdsa crate, instantiated over k256's
// secp256k1. Everything here speaks compact (r || s) signatures; DER lives
// in crate::der.
use ecdsa::{
    signature::hazmat::{PrehashSigner, PrehashVerifier},
    Signature as ECDSASignature,
    SigningKey,
    VerifyingKey
};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::Secp256k1;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::der::{self, CompactSignature};
use crate::error::{Result, SigError};
use crate::sha256::Hash;
use crate::{COMPRESSED_PUBLIC_KEY_SIZE, PRIVATE_KEY_SIZE};

// Compressed SEC1 prefixes: even / odd y
const COMPRESSED_EVEN: u8 = 0x02;
const COMPRESSED_ODD: u8 = 0x03;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PublicKey(pub VerifyingKey<Secp256k1>);

impl PublicKey {
    /// Parse a 33-byte compressed point.
    pub fn from_compressed(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMPRESSED_PUBLIC_KEY_SIZE
            || !matches!(bytes[0], COMPRESSED_EVEN | COMPRESSED_ODD)
        {
            return Err(SigError::InvalidPublicKey);
        }
        VerifyingKey::from_sec1_bytes(bytes)
            .map(PublicKey)
            .map_err(|_| SigError::InvalidPublicKey)
    }

    pub fn to_compressed(&self) -> [u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        let point = k256::PublicKey::from(&self.0).to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_PUBLIC_KEY_SIZE];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Verify a compact signature over a prehashed message.
    ///
    /// Scalars outside `[1, n)` and high-S values are rejected by the
    /// curve library, not here.
    pub fn verify_prehash(&self, hash: &Hash, signature: &CompactSignature) -> bool {
        let signature = match ECDSASignature::<Secp256k1>::from_slice(&signature.to_bytes()) {
            Ok(signature) => signature,
            Err(_) => {
                trace!("signature scalars out of range");
                return false;
            }
        };
        self.0.verify_prehash(hash.as_bytes(), &signature).is_ok()
    }

    /// Decode `der` and verify it. Any decode failure fails closed.
    pub fn verify_der(&self, hash: &Hash, der: &[u8]) -> bool {
        let signature = match der::decode(der) {
            Ok(signature) => signature,
            Err(e) => {
                debug!(error = %e, "rejecting undecodable signature");
                return false;
            }
        };
        let valid = self.verify_prehash(hash, &signature);
        if !valid {
            debug!(%hash, "signature does not verify");
        }
        valid
    }
}

/// Verify a DER signature against a bare compressed public key.
///
/// For callers validating someone else's signature, where no private key
/// is at hand. An unparseable key is treated like a bad signature.
pub fn verify_der(public_key: &[u8], hash: &Hash, der: &[u8]) -> bool {
    match PublicKey::from_compressed(public_key) {
        Ok(public_key) => public_key.verify_der(hash, der),
        Err(e) => {
            debug!(error = %e, "rejecting signature for unparseable public key");
            false
        }
    }
}

// Custom serialization needed because SigningKey doesn't implement Serialize/Deserialize
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrivateKey(
    #[serde(with = "signkey_serde")]
    pub SigningKey<Secp256k1>
);

// Internal module for custom serialization
mod signkey_serde {
    use serde::de::Error as _;
    use serde::Deserialize;

    pub fn serialize<S>(
        key: &super::SigningKey<super::Secp256k1>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&key.to_bytes())
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<super::SigningKey<super::Secp256k1>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Deserialize bytes first, then convert to SigningKey
        let bytes: Vec<u8> = Vec::<u8>::deserialize(deserializer)?;
        super::SigningKey::from_slice(&bytes).map_err(D::Error::custom)
    }
}

impl PrivateKey {
    // Fresh key from the thread-local CSPRNG
    pub fn new_key() -> Self {
        PrivateKey(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Fails with [`SigError::InvalidPrivateKey`] for zero or for scalars
    /// at or above the curve order.
    pub fn from_bytes(bytes: &[u8; PRIVATE_KEY_SIZE]) -> Result<Self> {
        SigningKey::from_slice(bytes)
            .map(PrivateKey)
            .map_err(|_| SigError::InvalidPrivateKey)
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        let mut out = [0u8; PRIVATE_KEY_SIZE];
        out.copy_from_slice(&self.0.to_bytes());
        out
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().clone())
    }

    /// Deterministic (RFC 6979) ECDSA over a prehashed message.
    pub fn sign_prehash(&self, hash: &Hash) -> Result<CompactSignature> {
        let signature: ECDSASignature<Secp256k1> = self
            .0
            .sign_prehash(hash.as_bytes())
            .map_err(|e| SigError::SigningFailed(Box::new(e)))?;
        CompactSignature::from_slice(&signature.to_bytes())
    }
}

// Low-S policy helpers. Neither the codec nor verify_der applies these on
// its own; callers that enforce BIP-0062 style canonicality opt in.
impl CompactSignature {
    /// Whether s is in the lower half of the curve order.
    ///
    /// False when r or s is not a valid scalar at all.
    pub fn is_low_s(&self) -> bool {
        match ECDSASignature::<Secp256k1>::from_slice(&self.to_bytes()) {
            Ok(signature) => signature.normalize_s().is_none(),
            Err(_) => false,
        }
    }

    /// The same signature with s replaced by `n - s` when s is high.
    ///
    /// Returns `None` when r or s lies outside `[1, n)`.
    pub fn normalize_s(&self) -> Option<CompactSignature> {
        let signature = ECDSASignature::<Secp256k1>::from_slice(&self.to_bytes()).ok()?;
        match signature.normalize_s() {
            Some(normalized) => CompactSignature::from_slice(&normalized.to_bytes()).ok(),
            None => Some(*self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // secp256k1 order n
    const ORDER: [u8; 32] =
        hex!("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141");

    fn order_minus(s: &[u8; 32]) -> [u8; 32] {
        let mut out = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut diff = ORDER[i] as i16 - s[i] as i16 - borrow;
            borrow = 0;
            if diff < 0 {
                diff += 256;
                borrow = 1;
            }
            out[i] = diff as u8;
        }
        out
    }

    fn private_key_one() -> PrivateKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        PrivateKey::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn generator_is_public_key_of_one() {
        assert_eq!(
            private_key_one().public_key().to_compressed(),
            hex!("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
        );
    }

    #[test]
    fn rejects_out_of_range_private_keys() {
        assert!(matches!(
            PrivateKey::from_bytes(&[0u8; 32]),
            Err(SigError::InvalidPrivateKey)
        ));
        assert!(matches!(
            PrivateKey::from_bytes(&ORDER),
            Err(SigError::InvalidPrivateKey)
        ));
        assert!(matches!(
            PrivateKey::from_bytes(&[0xff; 32]),
            Err(SigError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn private_key_bytes_round_trip() {
        let key = PrivateKey::new_key();
        let again = PrivateKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(again.public_key(), key.public_key());
    }

    #[test]
    fn compressed_public_key_round_trip() {
        let public_key = PrivateKey::new_key().public_key();
        let bytes = public_key.to_compressed();
        assert!(matches!(bytes[0], 0x02 | 0x03));
        assert_eq!(PublicKey::from_compressed(&bytes).unwrap(), public_key);
    }

    #[test]
    fn rejects_uncompressed_and_garbage_public_keys() {
        let public_key = private_key_one().public_key();
        let uncompressed = k256::PublicKey::from(&public_key.0).to_encoded_point(false);
        assert!(matches!(
            PublicKey::from_compressed(uncompressed.as_bytes()),
            Err(SigError::InvalidPublicKey)
        ));
        assert!(PublicKey::from_compressed(&[0x04; 33]).is_err());
        assert!(PublicKey::from_compressed(&[0x02; 32]).is_err());
    }

    #[test]
    fn signatures_are_low_s_and_verify() {
        let key = PrivateKey::new_key();
        let hash = Hash::digest(b"prehashed").unwrap();
        let signature = key.sign_prehash(&hash).unwrap();
        assert!(signature.is_low_s());
        assert!(key.public_key().verify_prehash(&hash, &signature));
    }

    #[test]
    fn normalize_s_flips_high_s() {
        let key = PrivateKey::new_key();
        let hash = Hash::digest(b"malleable").unwrap();
        let low = key.sign_prehash(&hash).unwrap();

        let s = order_minus(low.s());
        let high = CompactSignature::new(*low.r(), s);

        assert!(!high.is_low_s());
        assert_eq!(high.normalize_s(), Some(low));
        assert_eq!(low.normalize_s(), Some(low));
        // the curve library refuses the high-S twin
        assert!(!key.public_key().verify_prehash(&hash, &high));
    }

    #[test]
    fn out_of_range_scalars_are_not_low_s() {
        let zero = CompactSignature::new([0u8; 32], [0u8; 32]);
        assert!(!zero.is_low_s());
        assert_eq!(zero.normalize_s(), None);
        let too_big = CompactSignature::new(ORDER, [1u8; 32]);
        assert_eq!(too_big.normalize_s(), None);
    }

    #[test]
    fn verify_der_with_bare_public_key() {
        let key = PrivateKey::new_key();
        let hash = Hash::digest(b"spend").unwrap();
        let der = key.sign_prehash(&hash).unwrap().to_der();
        let public_key = key.public_key().to_compressed();
        assert!(verify_der(&public_key, &hash, &der));
        assert!(!verify_der(&public_key[..32], &hash, &der));
        assert!(!verify_der(&public_key, &Hash::zero(), &der));
        assert!(!verify_der(&public_key, &hash, &der[1..]));
    }

    #[test]
    fn private_key_deserializer_rejects_bad_material() {
        use serde::de::value::{Error as ValueError, SeqDeserializer};

        let bytes = private_key_one().to_bytes();
        let key = signkey_serde::deserialize(SeqDeserializer::<_, ValueError>::new(
            bytes.to_vec().into_iter(),
        ))
        .unwrap();
        assert_eq!(PrivateKey(key).to_bytes(), bytes);

        let zero = signkey_serde::deserialize(SeqDeserializer::<_, ValueError>::new(
            vec![0u8; 32].into_iter(),
        ));
        assert!(zero.is_err());
    }
}
