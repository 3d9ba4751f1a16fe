use std::fmt;
use thiserror::Error;

/// Why a DER signature was rejected.
///
/// Each variant maps to one strict-DER check, in the order `der::decode`
/// performs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Ran out of bytes while reading a tag, length or integer body
    Truncated,
    /// First byte is not the SEQUENCE tag
    NotSequence,
    /// A length byte uses the DER long form
    LongFormLength,
    /// Declared SEQUENCE length differs from the bytes that follow it
    LengthMismatch,
    /// Expected an INTEGER tag for r or s
    NotInteger,
    /// Zero-length integer
    EmptyInteger,
    /// High bit set without a 0x00 pad byte
    NegativeInteger,
    /// Redundant leading 0x00
    NonMinimalInteger,
    /// More than 32 bytes once the pad byte is removed
    IntegerTooLarge,
    /// Bytes left inside the SEQUENCE after s
    TrailingBytes,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let reason = match self {
            MalformedReason::Truncated => "truncated",
            MalformedReason::NotSequence => "missing SEQUENCE tag",
            MalformedReason::LongFormLength => "long-form length",
            MalformedReason::LengthMismatch => "SEQUENCE length mismatch",
            MalformedReason::NotInteger => "missing INTEGER tag",
            MalformedReason::EmptyInteger => "empty INTEGER",
            MalformedReason::NegativeInteger => "negative INTEGER",
            MalformedReason::NonMinimalInteger => "non-minimal INTEGER",
            MalformedReason::IntegerTooLarge => "INTEGER exceeds 32 bytes",
            MalformedReason::TrailingBytes => "trailing bytes after s",
        };
        f.write_str(reason)
    }
}

#[derive(Error, Debug)]
pub enum SigError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid compact signature length: expected 64 bytes, got {0}")]
    InvalidLength(usize),
    #[error("Malformed signature: {0}")]
    MalformedSignature(MalformedReason),
    #[error("Hashing failed: {0}")]
    HashingFailed(String),
    #[error("Signing failed: {0}")]
    SigningFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SigError {
    /// Reason code for a DER rejection, if this is one.
    pub fn malformed_reason(&self) -> Option<MalformedReason> {
        match self {
            SigError::MalformedSignature(reason) => Some(*reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SigError>;
