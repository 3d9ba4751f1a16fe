use crate::crypto::{PrivateKey, PublicKey};
use crate::error::{Result, SigError};
use crate::sha256::Hash;
use crate::{COMPRESSED_PUBLIC_KEY_SIZE, PRIVATE_KEY_SIZE};
use std::fmt;
use std::future::{self, Future};
use tracing::{debug, trace};

/// Signing capability over secp256k1 with DER signatures on the wire.
///
/// `sign` and `verify` take a 32-byte prehash and never hash anything
/// themselves.
pub trait EllipticPair {
    fn public_key(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_SIZE];
    fn private_key(&self) -> [u8; PRIVATE_KEY_SIZE];
    fn sign(&self, hash: &Hash) -> Result<Vec<u8>>;
    fn verify(&self, hash: &Hash, signature: &[u8]) -> bool;
}

/// Async form of [`EllipticPair`] for backends that suspend, such as a
/// hardware token or a remote signer.
///
/// There is no `private_key` here since such backends never hand it out.
/// Calls are not retried and carry no timeout; wrap them if you need one.
/// Every [`EllipticPair`] gets this for free, resolving immediately.
pub trait AsyncEllipticPair {
    fn public_key(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_SIZE];
    fn sign(&self, hash: &Hash) -> impl Future<Output = Result<Vec<u8>>> + Send;
    fn verify(&self, hash: &Hash, signature: &[u8]) -> impl Future<Output = bool> + Send;
}

impl<T: EllipticPair> AsyncEllipticPair for T {
    fn public_key(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        EllipticPair::public_key(self)
    }

    fn sign(&self, hash: &Hash) -> impl Future<Output = Result<Vec<u8>>> + Send {
        future::ready(EllipticPair::sign(self, hash))
    }

    fn verify(&self, hash: &Hash, signature: &[u8]) -> impl Future<Output = bool> + Send {
        future::ready(EllipticPair::verify(self, hash, signature))
    }
}

/// In-memory key pair. The public key is derived once at construction.
#[derive(Clone)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
    compressed: [u8; COMPRESSED_PUBLIC_KEY_SIZE],
}

impl KeyPair {
    pub fn new(private_key: &[u8; PRIVATE_KEY_SIZE]) -> Result<Self> {
        Ok(KeyPair::from(PrivateKey::from_bytes(private_key)?))
    }

    /// Like [`KeyPair::new`], but a wrong-sized slice is also an
    /// [`SigError::InvalidPrivateKey`].
    pub fn from_slice(private_key: &[u8]) -> Result<Self> {
        let bytes: &[u8; PRIVATE_KEY_SIZE] = private_key
            .try_into()
            .map_err(|_| SigError::InvalidPrivateKey)?;
        KeyPair::new(bytes)
    }

    pub fn generate() -> Self {
        KeyPair::from(PrivateKey::new_key())
    }

    pub fn public_key(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        &self.compressed
    }

    pub fn private_key(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.private_key.to_bytes()
    }

    pub fn verifying_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Sign a prehash, returning the DER signature without a SIGHASH byte.
    pub fn sign(&self, hash: &Hash) -> Result<Vec<u8>> {
        trace!(%hash, "signing");
        let signature = self.private_key.sign_prehash(hash)?;
        Ok(signature.to_der())
    }

    pub fn verify(&self, hash: &Hash, signature: &[u8]) -> bool {
        self.public_key.verify_der(hash, signature)
    }
}

impl From<PrivateKey> for KeyPair {
    fn from(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        let compressed = public_key.to_compressed();
        debug!(public_key = %hex::encode(compressed), "derived key pair");
        KeyPair {
            private_key,
            public_key,
            compressed,
        }
    }
}

// Keep the private scalar out of logs
impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.compressed))
            .finish_non_exhaustive()
    }
}

impl EllipticPair for KeyPair {
    fn public_key(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        KeyPair::public_key(self)
    }

    fn private_key(&self) -> [u8; PRIVATE_KEY_SIZE] {
        KeyPair::private_key(self)
    }

    fn sign(&self, hash: &Hash) -> Result<Vec<u8>> {
        KeyPair::sign(self, hash)
    }

    fn verify(&self, hash: &Hash, signature: &[u8]) -> bool {
        KeyPair::verify(self, hash, signature)
    }
}
