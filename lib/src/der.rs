//! Strict DER codec for ECDSA signatures (BIP-0066).
//!
//! ```text
//! 0x30 <total-len> 0x02 <r-len> <r-bytes> 0x02 <s-len> <s-bytes>
//! ```
//!
//! The SIGHASH type byte that follows a signature inside a script is not part
//! of this payload; callers append and strip it themselves. Low-S is not
//! enforced here either, see [`CompactSignature::is_low_s`].
use crate::error::{MalformedReason, Result, SigError};
use crate::{COMPACT_SIGNATURE_SIZE, MAX_DER_SIGNATURE_SIZE, SCALAR_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SEQUENCE_TAG: u8 = 0x30;
pub const INTEGER_TAG: u8 = 0x02;

/// ECDSA signature as two 32-byte big-endian scalars, r then s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompactSignature {
    r: [u8; SCALAR_SIZE],
    s: [u8; SCALAR_SIZE],
}

impl CompactSignature {
    pub fn new(r: [u8; SCALAR_SIZE], s: [u8; SCALAR_SIZE]) -> Self {
        CompactSignature { r, s }
    }

    /// Split a 64-byte `r || s` buffer.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMPACT_SIGNATURE_SIZE {
            return Err(SigError::InvalidLength(bytes.len()));
        }
        let mut r = [0u8; SCALAR_SIZE];
        let mut s = [0u8; SCALAR_SIZE];
        r.copy_from_slice(&bytes[..SCALAR_SIZE]);
        s.copy_from_slice(&bytes[SCALAR_SIZE..]);
        Ok(CompactSignature { r, s })
    }

    pub fn r(&self) -> &[u8; SCALAR_SIZE] {
        &self.r
    }

    pub fn s(&self) -> &[u8; SCALAR_SIZE] {
        &self.s
    }

    pub fn to_bytes(&self) -> [u8; COMPACT_SIGNATURE_SIZE] {
        let mut bytes = [0u8; COMPACT_SIGNATURE_SIZE];
        bytes[..SCALAR_SIZE].copy_from_slice(&self.r);
        bytes[SCALAR_SIZE..].copy_from_slice(&self.s);
        bytes
    }

    pub fn to_der(&self) -> Vec<u8> {
        let r = minimal_integer(&self.r);
        let s = minimal_integer(&self.s);
        let body_len = 2 + r.len() + 2 + s.len();
        let mut der = Vec::with_capacity(2 + body_len);
        der.push(SEQUENCE_TAG);
        // at most 2 * (2 + 33) = 70, always short form
        der.push(body_len as u8);
        der.push(INTEGER_TAG);
        der.push(r.len() as u8);
        der.extend_from_slice(&r);
        der.push(INTEGER_TAG);
        der.push(s.len() as u8);
        der.extend_from_slice(&s);
        der
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        decode(der)
    }
}

impl fmt::Display for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", hex::encode(self.r), hex::encode(self.s))
    }
}

/// Encode a 64-byte compact signature as strict DER.
///
/// Fails with [`SigError::InvalidLength`] unless `compact` is exactly 64
/// bytes. No SIGHASH byte is appended.
pub fn encode(compact: &[u8]) -> Result<Vec<u8>> {
    Ok(CompactSignature::from_slice(compact)?.to_der())
}

/// Decode a strict DER signature into its compact form.
///
/// Rejects every non-canonical encoding with
/// [`SigError::MalformedSignature`]. The returned scalars are exactly what
/// was encoded; no range or low-S check is applied.
pub fn decode(der: &[u8]) -> Result<CompactSignature> {
    let mut reader = DerReader::new(der);

    if reader.byte()? != SEQUENCE_TAG {
        return Err(malformed(MalformedReason::NotSequence));
    }
    let declared = reader.length()?;
    if declared != reader.remaining() {
        return Err(malformed(MalformedReason::LengthMismatch));
    }

    let r = reader.integer()?;
    let s = reader.integer()?;

    if reader.remaining() != 0 {
        return Err(malformed(MalformedReason::TrailingBytes));
    }
    Ok(CompactSignature::new(r, s))
}

/// Whether `der` passes every check [`decode`] performs.
pub fn is_strict_der(der: &[u8]) -> bool {
    der.len() <= MAX_DER_SIGNATURE_SIZE && decode(der).is_ok()
}

fn malformed(reason: MalformedReason) -> SigError {
    SigError::MalformedSignature(reason)
}

/// Shortest big-endian form of `scalar`, with a 0x00 pad when the high bit
/// would otherwise read as a sign bit. Zero encodes as a single 0x00.
fn minimal_integer(scalar: &[u8; SCALAR_SIZE]) -> Vec<u8> {
    let start = scalar
        .iter()
        .position(|&byte| byte != 0)
        .unwrap_or(SCALAR_SIZE);
    let digits = &scalar[start..];
    let mut out = Vec::with_capacity(digits.len() + 1);
    if digits.first().map_or(true, |&byte| byte & 0x80 != 0) {
        out.push(0x00);
    }
    out.extend_from_slice(digits);
    out
}

struct DerReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        DerReader { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn byte(&mut self) -> Result<u8> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| malformed(MalformedReason::Truncated))?;
        self.pos += 1;
        Ok(byte)
    }

    fn length(&mut self) -> Result<usize> {
        let len = self.byte()?;
        if len & 0x80 != 0 {
            return Err(malformed(MalformedReason::LongFormLength));
        }
        Ok(len as usize)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(malformed(MalformedReason::Truncated));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Read one INTEGER and left-pad it to a 32-byte scalar.
    fn integer(&mut self) -> Result<[u8; SCALAR_SIZE]> {
        if self.byte()? != INTEGER_TAG {
            return Err(malformed(MalformedReason::NotInteger));
        }
        let len = self.length()?;
        let body = self.take(len)?;

        let (&first, rest) = body
            .split_first()
            .ok_or_else(|| malformed(MalformedReason::EmptyInteger))?;
        if first & 0x80 != 0 {
            return Err(malformed(MalformedReason::NegativeInteger));
        }
        let digits = match rest.first() {
            Some(&next) if first == 0x00 => {
                if next & 0x80 == 0 {
                    return Err(malformed(MalformedReason::NonMinimalInteger));
                }
                rest
            }
            _ => body,
        };
        if digits.len() > SCALAR_SIZE {
            return Err(malformed(MalformedReason::IntegerTooLarge));
        }

        let mut scalar = [0u8; SCALAR_SIZE];
        scalar[SCALAR_SIZE - digits.len()..].copy_from_slice(digits);
        Ok(scalar)
    }
}
