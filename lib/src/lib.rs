//! secp256k1 key pairs with strict DER (BIP-0066) signatures.
//!
//! [`der`] converts between compact `r || s` signatures and DER and is usable
//! on its own. [`KeyPair`] signs 32-byte prehashes and hands back DER.
//!
//! ```
//! use ecpair_lib::{der, Hash, KeyPair};
//!
//! let pair = KeyPair::generate();
//! let hash = Hash::digest(b"payload").unwrap();
//! let signature = pair.sign(&hash).unwrap();
//! assert!(pair.verify(&hash, &signature));
//! let compact = der::decode(&signature).unwrap();
//! assert_eq!(der::encode(&compact.to_bytes()).unwrap(), signature);
//! ```
pub mod crypto;
pub mod der;
pub mod error;
pub mod pair;
pub mod sha256;

pub use crypto::{verify_der, PrivateKey, PublicKey};
pub use der::CompactSignature;
pub use error::{MalformedReason, Result, SigError};
pub use pair::{AsyncEllipticPair, EllipticPair, KeyPair};
pub use self::sha256::Hash;

// Byte sizes on the wire
pub const SCALAR_SIZE: usize = 32;
pub const COMPACT_SIGNATURE_SIZE: usize = 2 * SCALAR_SIZE;
pub const PRIVATE_KEY_SIZE: usize = 32;
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;
// SEQUENCE header + two INTEGERs of 33 bytes each
pub const MAX_DER_SIGNATURE_SIZE: usize = 2 + 2 * (2 + SCALAR_SIZE + 1);
