//! ECDSA signatures over secp256k1.
//!
//! Script signatures arrive DER-encoded with the hash-type byte already
//! stripped. Parsing is tolerant of the non-canonical integer padding that
//! older transactions carry; serialization always produces strict DER with
//! a low S value.

use k256::ecdsa;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::FieldBytes;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// An ECDSA signature.
///
/// Holds a k256 signature whose R and S are both non-zero and below the
/// curve order. S may be high when parsed from chain data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    inner: ecdsa::Signature,
}

impl Signature {
    /// Build a signature from big-endian R and S.
    ///
    /// # Returns
    /// An error when either scalar is zero or not below the curve order.
    pub fn from_scalars(r: [u8; 32], s: [u8; 32]) -> Result<Self, PrimitivesError> {
        let inner = ecdsa::Signature::from_scalars(FieldBytes::from(r), FieldBytes::from(s))
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(Signature { inner })
    }

    /// The R component, big-endian.
    pub fn r(&self) -> [u8; 32] {
        self.inner.r().to_bytes().into()
    }

    /// The S component, big-endian.
    pub fn s(&self) -> [u8; 32] {
        self.inner.s().to_bytes().into()
    }

    /// Parse a DER signature: `0x30 <len> 0x02 <r_len> <r> 0x02 <s_len> <s>`.
    ///
    /// Integers may carry redundant leading zeros. Trailing bytes beyond
    /// the declared sequence length are ignored.
    ///
    /// # Arguments
    /// * `bytes` - DER signature without the hash-type suffix.
    ///
    /// # Returns
    /// `Ok(Signature)`, or `InvalidSignature` describing the first defect.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() < 8 {
            return Err(malformed("too short"));
        }
        if bytes[0] != 0x30 {
            return Err(malformed("no sequence marker"));
        }
        let body_len = bytes[1] as usize;
        let body = bytes
            .get(2..2 + body_len)
            .ok_or_else(|| malformed("sequence length exceeds data"))?;

        let (r, rest) = read_der_integer(body, "R")?;
        let (s, _) = read_der_integer(rest, "S")?;
        Self::from_scalars(r, s)
    }

    /// Serialize as strict DER, flipping S into the lower half of the order.
    pub fn to_der(&self) -> Vec<u8> {
        let sig = self.inner.normalize_s().unwrap_or(self.inner);
        sig.to_der().as_bytes().to_vec()
    }

    /// True when S is already in the lower half of the curve order.
    pub fn is_low_s(&self) -> bool {
        self.inner.normalize_s().is_none()
    }

    /// Sign a 32-byte digest with an RFC6979 deterministic nonce.
    ///
    /// The digest is signed as-is; callers pass a sighash, not a message.
    pub fn sign(hash: &[u8; 32], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let (sig, _) = priv_key
            .signing_key()
            .sign_prehash_recoverable(hash)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(Signature {
            inner: sig.normalize_s().unwrap_or(sig),
        })
    }

    /// Check this signature against a 32-byte digest.
    ///
    /// High-S signatures are normalized first, so signatures mined before
    /// low-S became policy still verify.
    pub fn verify(&self, hash: &[u8; 32], pub_key: &PublicKey) -> bool {
        let sig = self.inner.normalize_s().unwrap_or(self.inner);
        pub_key.verifying_key().verify_prehash(hash, &sig).is_ok()
    }
}

fn malformed(reason: &str) -> PrimitivesError {
    PrimitivesError::InvalidSignature(format!("malformed signature: {}", reason))
}

/// Read one `0x02 <len> <bytes>` integer and return it left-padded to 32
/// bytes together with the unread remainder.
fn read_der_integer<'a>(
    data: &'a [u8],
    name: &str,
) -> Result<([u8; 32], &'a [u8]), PrimitivesError> {
    if data.len() < 2 || data[0] != 0x02 {
        return Err(malformed(&format!("no {} integer marker", name)));
    }
    let len = data[1] as usize;
    if len == 0 {
        return Err(malformed(&format!("empty {}", name)));
    }
    let value = data
        .get(2..2 + len)
        .ok_or_else(|| malformed(&format!("bogus {} length", name)))?;

    let first_nonzero = value.iter().position(|&b| b != 0).unwrap_or(value.len());
    let trimmed = &value[first_nonzero..];
    if trimmed.len() > 32 {
        return Err(malformed(&format!("{} wider than 32 bytes", name)));
    }
    let mut out = [0u8; 32];
    out[32 - trimmed.len()..].copy_from_slice(trimmed);
    Ok((out, &data[2 + len..]))
}
