//! Signature hash computation.
//!
//! The digest a signature commits to depends on the hash type byte
//! appended to it. With the fork-id bit set the BIP143 digest is used
//! ([`forkid`]), otherwise the original serialization-based one
//! ([`legacy`]).
//!
//! See <https://github.com/bitcoin-sv/bitcoin-sv/blob/master/doc/abc/replay-protected-sighash.md#digest-algorithm>

pub mod forkid;
pub mod legacy;

use coinkit_script::interpreter::SignatureError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs.
pub const SIGHASH_ALL: u8 = 0x01;

/// Sign all inputs but no outputs.
pub const SIGHASH_NONE: u8 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u8 = 0x03;

/// Selects the BIP143 digest and separates BCH signatures from BTC ones.
pub const SIGHASH_FORKID: u8 = 0x40;

/// Only sign the current input, so others may be added later.
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

/// Mask applied to extract the base type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u8 = 0x1f;

/// The hash type byte that ends every transaction signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SighashType(u8);

impl SighashType {
    pub const BTC_ALL: SighashType = SighashType(SIGHASH_ALL);
    pub const BTC_NONE: SighashType = SighashType(SIGHASH_NONE);
    pub const BTC_SINGLE: SighashType = SighashType(SIGHASH_SINGLE);
    pub const BTC_ALL_ANYONECANPAY: SighashType = SighashType(SIGHASH_ALL | SIGHASH_ANYONECANPAY);
    pub const BTC_NONE_ANYONECANPAY: SighashType = SighashType(SIGHASH_NONE | SIGHASH_ANYONECANPAY);
    pub const BTC_SINGLE_ANYONECANPAY: SighashType =
        SighashType(SIGHASH_SINGLE | SIGHASH_ANYONECANPAY);

    pub const BCH_ALL: SighashType = SighashType(SIGHASH_FORKID | SIGHASH_ALL);
    pub const BCH_NONE: SighashType = SighashType(SIGHASH_FORKID | SIGHASH_NONE);
    pub const BCH_SINGLE: SighashType = SighashType(SIGHASH_FORKID | SIGHASH_SINGLE);
    pub const BCH_ALL_ANYONECANPAY: SighashType =
        SighashType(SIGHASH_FORKID | SIGHASH_ALL | SIGHASH_ANYONECANPAY);
    pub const BCH_NONE_ANYONECANPAY: SighashType =
        SighashType(SIGHASH_FORKID | SIGHASH_NONE | SIGHASH_ANYONECANPAY);
    pub const BCH_SINGLE_ANYONECANPAY: SighashType =
        SighashType(SIGHASH_FORKID | SIGHASH_SINGLE | SIGHASH_ANYONECANPAY);

    /// Wrap a raw hash type byte. Any byte is accepted here; the digest
    /// functions reject undefined base types.
    pub fn from_byte(byte: u8) -> Self {
        SighashType(byte)
    }

    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// The value written into the digest preimage.
    pub fn to_u32(self) -> u32 {
        u32::from(self.0)
    }

    /// The low five bits.
    pub fn base(self) -> u8 {
        self.0 & SIGHASH_MASK
    }

    pub fn is_all(self) -> bool {
        self.base() == SIGHASH_ALL
    }

    pub fn is_none(self) -> bool {
        self.base() == SIGHASH_NONE
    }

    pub fn is_single(self) -> bool {
        self.base() == SIGHASH_SINGLE
    }

    pub fn has_fork_id(self) -> bool {
        self.0 & SIGHASH_FORKID != 0
    }

    pub fn anyone_can_pay(self) -> bool {
        self.0 & SIGHASH_ANYONECANPAY != 0
    }

    /// Fails with `InvalidHashType` unless the base type is ALL, NONE or
    /// SINGLE.
    pub fn validate(self) -> Result<Self, SignatureError> {
        match self.base() {
            SIGHASH_ALL | SIGHASH_NONE | SIGHASH_SINGLE => Ok(self),
            _ => Err(SignatureError::InvalidHashType(self.0)),
        }
    }
}

impl From<SighashType> for u8 {
    fn from(ht: SighashType) -> u8 {
        ht.0
    }
}

impl std::fmt::Display for SighashType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let base = match self.base() {
            SIGHASH_ALL => "ALL",
            SIGHASH_NONE => "NONE",
            SIGHASH_SINGLE => "SINGLE",
            _ => return write!(f, "UNDEFINED(0x{:02x})", self.0),
        };
        if self.has_fork_id() {
            write!(f, "FORKID|")?;
        }
        write!(f, "{}", base)?;
        if self.anyone_can_pay() {
            write!(f, "|ANYONECANPAY")?;
        }
        Ok(())
    }
}
