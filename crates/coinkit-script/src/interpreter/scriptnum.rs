//! Script number encoding.
//!
//! Numbers on the script stack are little-endian byte strings whose last
//! byte carries the sign in its high bit. Zero is the empty string, and a
//! value is stored in as few bytes as its magnitude and sign allow.
//! Arithmetic opcodes only accept operands of up to four bytes, but their
//! results may grow to five and still be pushed.

use super::error::ScriptExecutionError;

/// Widest operand arithmetic opcodes accept.
pub const MAX_NUMBER_LENGTH: usize = 4;

/// A decoded script number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptNumber(i64);

impl ScriptNumber {
    pub const ZERO: ScriptNumber = ScriptNumber(0);

    pub fn new(value: i64) -> Self {
        ScriptNumber(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Decode `bytes`, refusing anything longer than `max_len`.
    ///
    /// Non-minimal encodings (`0x00`, `0x80`, `0x0100`) are accepted and
    /// decode to the value they spell.
    ///
    /// # Returns
    /// `InvalidBignum` when `bytes` is wider than `max_len` or than eight
    /// bytes.
    pub fn from_bytes(bytes: &[u8], max_len: usize) -> Result<Self, ScriptExecutionError> {
        if bytes.len() > max_len || bytes.len() > 8 {
            return Err(ScriptExecutionError::InvalidBignum);
        }
        let Some((&last, _)) = bytes.split_last() else {
            return Ok(ScriptNumber::ZERO);
        };

        let mut magnitude: u64 = 0;
        for (i, &b) in bytes.iter().enumerate() {
            magnitude |= u64::from(b) << (8 * i);
        }
        let negative = last & 0x80 != 0;
        if negative {
            magnitude &= !(0x80u64 << (8 * (bytes.len() - 1)));
        }
        // An 8-byte magnitude may exceed i64::MAX; saturate rather than wrap.
        let value = i64::try_from(magnitude).unwrap_or(i64::MAX);
        Ok(ScriptNumber(if negative { -value } else { value }))
    }

    /// The minimal encoding of this number.
    pub fn to_bytes(self) -> Vec<u8> {
        if self.0 == 0 {
            return Vec::new();
        }
        let negative = self.0 < 0;
        let mut magnitude = self.0.unsigned_abs();
        let mut out = Vec::with_capacity(9);
        while magnitude > 0 {
            out.push((magnitude & 0xff) as u8);
            magnitude >>= 8;
        }
        // The sign needs a byte of its own when the top bit is taken.
        match out.last_mut() {
            Some(top) if *top & 0x80 != 0 => out.push(if negative { 0x80 } else { 0x00 }),
            Some(top) if negative => *top |= 0x80,
            _ => {}
        }
        out
    }

    /// The value clamped into the `i32` range.
    pub fn to_i32(self) -> i32 {
        self.0.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}

impl From<i64> for ScriptNumber {
    fn from(value: i64) -> Self {
        ScriptNumber(value)
    }
}

impl From<i32> for ScriptNumber {
    fn from(value: i32) -> Self {
        ScriptNumber(i64::from(value))
    }
}

/// Strip redundant trailing bytes from a number encoding, keeping its value.
///
/// `[0x00]` and `[0x80]` (negative zero) both become empty.
pub fn minimally_encode(data: &[u8]) -> Vec<u8> {
    let Some((&last, rest)) = data.split_last() else {
        return Vec::new();
    };
    if last & 0x7f != 0 {
        return data.to_vec();
    }
    // `last` is only a sign byte. Find the highest byte that carries value.
    match rest.iter().rposition(|&b| b != 0) {
        None => Vec::new(),
        Some(i) => {
            let mut out = rest[..=i].to_vec();
            if out[i] & 0x80 != 0 {
                // The sign bit would collide with the magnitude; keep a sign byte.
                out.push(last);
            } else {
                out[i] |= last;
            }
            out
        }
    }
}
