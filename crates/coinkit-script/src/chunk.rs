//! Script chunk parsing and encoding.
//!
//! A script chunk is either a bare opcode or a data push together with the
//! length encoding it was written with. Parsing never reorders or drops
//! bytes: serializing the chunks of a parsed script reproduces its input.

use std::fmt;

use crate::opcodes::*;
use crate::{ScriptError, ScriptParseError};

/// How a push spells out the length of its data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PushEncoding {
    /// The opcode byte is the length (0..=75).
    Implicit,
    /// `OP_PUSHDATA1` followed by a 1-byte length.
    PushData1,
    /// `OP_PUSHDATA2` followed by a 2-byte little-endian length.
    PushData2,
    /// `OP_PUSHDATA4` followed by a 4-byte little-endian length.
    PushData4,
}

impl PushEncoding {
    /// The most compact encoding able to carry `len` bytes.
    pub fn minimal_for(len: usize) -> Self {
        if len < OP_PUSHDATA1 as usize {
            PushEncoding::Implicit
        } else if len <= 0xff {
            PushEncoding::PushData1
        } else if len <= 0xffff {
            PushEncoding::PushData2
        } else {
            PushEncoding::PushData4
        }
    }

    /// Largest payload this encoding can describe.
    pub fn capacity(self) -> usize {
        match self {
            PushEncoding::Implicit => OP_PUSHDATA1 as usize - 1,
            PushEncoding::PushData1 => 0xff,
            PushEncoding::PushData2 => 0xffff,
            PushEncoding::PushData4 => u32::MAX as usize,
        }
    }

    /// Bytes spent on the opcode plus its length field.
    pub fn prefix_len(self) -> usize {
        match self {
            PushEncoding::Implicit => 1,
            PushEncoding::PushData1 => 2,
            PushEncoding::PushData2 => 3,
            PushEncoding::PushData4 => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PushEncoding::Implicit => "implicit push",
            PushEncoding::PushData1 => "OP_PUSHDATA1",
            PushEncoding::PushData2 => "OP_PUSHDATA2",
            PushEncoding::PushData4 => "OP_PUSHDATA4",
        }
    }
}

/// A single parsed element of a script.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScriptChunk {
    /// Any opcode above `OP_PUSHDATA4`.
    Opcode(Opcode),
    /// A data push. `OP_0` is an implicit push of zero bytes.
    Push { encoding: PushEncoding, data: Vec<u8> },
}

impl ScriptChunk {
    /// A push of `data` using the most compact encoding.
    pub fn push(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        ScriptChunk::Push {
            encoding: PushEncoding::minimal_for(data.len()),
            data,
        }
    }

    /// A push of `data` using a caller-chosen encoding.
    ///
    /// # Returns
    /// `EncodingTooSmall` when the encoding cannot describe `data.len()`.
    pub fn push_with_encoding(
        data: impl Into<Vec<u8>>,
        encoding: PushEncoding,
    ) -> Result<Self, ScriptError> {
        let data = data.into();
        if data.len() > encoding.capacity() {
            return Err(ScriptError::EncodingTooSmall {
                encoding: encoding.name(),
                length: data.len(),
            });
        }
        Ok(ScriptChunk::Push { encoding, data })
    }

    /// The opcode that starts this chunk.
    ///
    /// For pushes this is `OP_0`, `PushBytes(n)` or one of the PUSHDATA
    /// opcodes.
    pub fn opcode(&self) -> Opcode {
        match self {
            ScriptChunk::Opcode(op) => *op,
            ScriptChunk::Push { encoding, data } => match self.effective_encoding(*encoding, data) {
                PushEncoding::Implicit if data.is_empty() => Opcode::Op0,
                PushEncoding::Implicit => Opcode::PushBytes(data.len() as u8),
                PushEncoding::PushData1 => Opcode::PushData1,
                PushEncoding::PushData2 => Opcode::PushData2,
                PushEncoding::PushData4 => Opcode::PushData4,
            },
        }
    }

    /// The pushed bytes, or `None` for an opcode chunk.
    pub fn pushed_data(&self) -> Option<&[u8]> {
        match self {
            ScriptChunk::Push { data, .. } => Some(data),
            ScriptChunk::Opcode(_) => None,
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, ScriptChunk::Push { .. })
    }

    /// Number of bytes this chunk occupies in a serialized script.
    pub fn encoded_len(&self) -> usize {
        match self {
            ScriptChunk::Opcode(_) => 1,
            ScriptChunk::Push { encoding, data } => {
                self.effective_encoding(*encoding, data).prefix_len() + data.len()
            }
        }
    }

    /// Append the serialized chunk to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            ScriptChunk::Opcode(op) => out.push(op.to_u8()),
            ScriptChunk::Push { encoding, data } => {
                let len = data.len();
                match self.effective_encoding(*encoding, data) {
                    PushEncoding::Implicit => out.push(len as u8),
                    PushEncoding::PushData1 => {
                        out.push(OP_PUSHDATA1);
                        out.push(len as u8);
                    }
                    PushEncoding::PushData2 => {
                        out.push(OP_PUSHDATA2);
                        out.extend_from_slice(&(len as u16).to_le_bytes());
                    }
                    PushEncoding::PushData4 => {
                        out.push(OP_PUSHDATA4);
                        out.extend_from_slice(&(len as u32).to_le_bytes());
                    }
                }
                out.extend_from_slice(data);
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        out
    }

    // A hand-built `Push` may name an encoding too small for its data;
    // such chunks are written with the minimal encoding instead.
    fn effective_encoding(&self, encoding: PushEncoding, data: &[u8]) -> PushEncoding {
        if data.len() > encoding.capacity() {
            PushEncoding::minimal_for(data.len())
        } else {
            encoding
        }
    }
}

/// Mnemonic form: opcode names, `OP_0` for empty pushes, hex for data.
impl fmt::Display for ScriptChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptChunk::Opcode(op) => write!(f, "{}", op),
            ScriptChunk::Push { data, .. } if data.is_empty() => f.write_str("OP_0"),
            ScriptChunk::Push { data, .. } => f.write_str(&hex::encode(data)),
        }
    }
}

/// Split raw script bytes into chunks.
///
/// A byte up to `OP_PUSHDATA4` starts a push whose length is the byte itself
/// or a 1/2/4-byte little-endian field after it. Every other byte is a
/// one-byte opcode. No semantic checks happen here; `OP_INVALIDOPCODE` and
/// unassigned bytes parse like any other opcode.
///
/// # Arguments
/// * `bytes` - The raw script.
///
/// # Returns
/// The chunks in script order, or a `ScriptParseError` naming the offset of
/// the first truncated chunk.
pub fn parse(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptParseError> {
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let offset = pos;
        let op = bytes[pos];
        pos += 1;

        let (encoding, length) = match op {
            OP_PUSHDATA1 => (PushEncoding::PushData1, read_length::<1>(bytes, &mut pos, offset)?),
            OP_PUSHDATA2 => (PushEncoding::PushData2, read_length::<2>(bytes, &mut pos, offset)?),
            OP_PUSHDATA4 => (PushEncoding::PushData4, read_length::<4>(bytes, &mut pos, offset)?),
            0x00..=0x4b => (PushEncoding::Implicit, op as usize),
            _ => {
                chunks.push(ScriptChunk::Opcode(Opcode::from_u8(op)));
                continue;
            }
        };

        let end = pos
            .checked_add(length)
            .filter(|&end| end <= bytes.len())
            .ok_or(ScriptParseError::PushOutOfBounds { offset, length })?;
        chunks.push(ScriptChunk::Push {
            encoding,
            data: bytes[pos..end].to_vec(),
        });
        pos = end;
    }

    Ok(chunks)
}

/// Read an N-byte little-endian length field at `*pos`.
fn read_length<const N: usize>(
    bytes: &[u8],
    pos: &mut usize,
    offset: usize,
) -> Result<usize, ScriptParseError> {
    let field = bytes
        .get(*pos..*pos + N)
        .ok_or(ScriptParseError::Truncated { offset })?;
    *pos += N;
    let mut le = [0u8; 8];
    le[..N].copy_from_slice(field);
    usize::try_from(u64::from_le_bytes(le)).map_err(|_| ScriptParseError::Truncated { offset })
}

/// Concatenate the serialized form of `chunks`.
pub fn serialize(chunks: &[ScriptChunk]) -> Vec<u8> {
    let mut out = Vec::with_capacity(chunks.iter().map(ScriptChunk::encoded_len).sum());
    for chunk in chunks {
        chunk.write_to(&mut out);
    }
    out
}
