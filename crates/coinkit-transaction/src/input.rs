//! Transaction inputs and the outpoints they spend.

use coinkit_primitives::chainhash::TxHash;
use coinkit_primitives::util::{ByteReader, ByteWriter};

use crate::TransactionError;

/// Sequence number of a finalized input (no relative lock time).
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// Serialized size of an [`OutPoint`].
pub const OUTPOINT_SIZE: usize = 36;

fn read_err(what: &str) -> impl FnOnce(coinkit_primitives::PrimitivesError) -> TransactionError + '_ {
    move |e| TransactionError::SerializationError(format!("reading {}: {}", what, e))
}

/// A reference to one output of an earlier transaction.
///
/// `hash` is kept in wire order; its `Display` shows the usual reversed
/// txid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub hash: TxHash,
    pub index: u32,
}

impl OutPoint {
    pub fn new(hash: TxHash, index: u32) -> Self {
        OutPoint { hash, index }
    }

    /// The outpoint coinbase inputs carry: a zero hash and index `0xffffffff`.
    pub fn null() -> Self {
        OutPoint {
            hash: TxHash::default(),
            index: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.index == u32::MAX && self.hash.is_zero()
    }

    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let hash = TxHash::new(reader.read_array::<32>().map_err(read_err("outpoint hash"))?);
        let index = reader.read_u32_le().map_err(read_err("outpoint index"))?;
        Ok(OutPoint { hash, index })
    }

    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_bytes(self.hash.as_bytes());
        writer.write_u32_le(self.index);
    }
}

impl std::fmt::Display for OutPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.hash, self.index)
    }
}

/// A single input of a transaction.
///
/// The unlocking script is kept as raw bytes: a transaction read off the
/// wire may carry a script that does not parse, and that must only fail
/// when the input is verified.
///
/// # Wire format
///
/// | Field            | Size           |
/// |------------------|----------------|
/// | previous_output  | 36 bytes       |
/// | script length    | VarInt         |
/// | signature_script | variable       |
/// | sequence         | 4 bytes (LE)   |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInput {
    pub previous_output: OutPoint,

    /// The unlocking script (scriptSig).
    pub signature_script: Vec<u8>,

    /// Defaults to [`DEFAULT_SEQUENCE_NUMBER`].
    pub sequence: u32,
}

impl TransactionInput {
    /// An unsigned, finalized input spending `previous_output`.
    pub fn new(previous_output: OutPoint) -> Self {
        TransactionInput {
            previous_output,
            signature_script: Vec::new(),
            sequence: DEFAULT_SEQUENCE_NUMBER,
        }
    }

    /// Deserialize an input from a `ByteReader`.
    ///
    /// # Returns
    /// `Ok(TransactionInput)`, or `SerializationError` naming the field that
    /// ran past the end of the data.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let previous_output = OutPoint::read_from(reader)?;
        let signature_script = reader
            .read_var_bytes()
            .map_err(read_err("unlocking script"))?
            .to_vec();
        let sequence = reader.read_u32_le().map_err(read_err("sequence number"))?;

        Ok(TransactionInput {
            previous_output,
            signature_script,
            sequence,
        })
    }

    pub fn write_to(&self, writer: &mut ByteWriter) {
        self.previous_output.write_to(writer);
        writer.write_var_bytes(&self.signature_script);
        writer.write_u32_le(self.sequence);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(OUTPOINT_SIZE + 5 + self.signature_script.len());
        self.write_to(&mut writer);
        writer.into_bytes()
    }
}
