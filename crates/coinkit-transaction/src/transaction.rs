//! Core transaction type.
//!
//! Binary and hex serialization, transaction ID, coinbase detection and
//! the signature hash of an input.

use coinkit_primitives::chainhash::TxHash;
use coinkit_primitives::util::{ByteReader, ByteWriter, VarInt};
use coinkit_script::interpreter::SignatureError;

use crate::input::{OutPoint, TransactionInput};
use crate::output::TransactionOutput;
use crate::sighash::{self, SighashType};
use crate::TransactionError;

/// A transaction: a version, inputs, outputs and a lock time.
///
/// # Wire format
///
/// | Field        | Size                      |
/// |--------------|---------------------------|
/// | version      | 4 bytes (LE)              |
/// | input count  | VarInt                    |
/// | inputs       | variable (per input)      |
/// | output count | VarInt                    |
/// | outputs      | variable (per output)     |
/// | lock_time    | 4 bytes (LE)              |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,

    /// Block height (below 500 000 000) or unix time before which the
    /// transaction is not final.
    pub lock_time: u32,
}

impl Transaction {
    /// An empty version 1 transaction with lock time 0.
    pub fn new() -> Self {
        Transaction {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a transaction from a hex-encoded string.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str).map_err(|e| {
            TransactionError::SerializationError(format!("invalid hex: {}", e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parse a transaction from raw bytes.
    ///
    /// The slice must hold exactly one transaction with no trailing data.
    ///
    /// # Returns
    /// `Ok(Transaction)`, or a `SerializationError` if the data is
    /// truncated or has trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = ByteReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::SerializationError(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Deserialize a transaction from a `ByteReader`, leaving any bytes
    /// after it unread.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let version = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading version: {}", e))
        })?;

        let input_count = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading input count: {}", e))
        })?;
        // Capacity is bounded by what the remaining bytes could hold.
        let mut inputs = Vec::with_capacity(capacity_hint(input_count, reader.remaining()));
        for _ in 0..input_count.value() {
            inputs.push(TransactionInput::read_from(reader)?);
        }

        let output_count = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading output count: {}", e))
        })?;
        let mut outputs = Vec::with_capacity(capacity_hint(output_count, reader.remaining()));
        for _ in 0..output_count.value() {
            outputs.push(TransactionOutput::read_from(reader)?);
        }

        let lock_time = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading lock time: {}", e))
        })?;

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u32_le(self.version);

        writer.write_varint(VarInt::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(writer);
        }

        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(writer);
        }

        writer.write_u32_le(self.lock_time);
    }

    /// Serialize this transaction to raw wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(256);
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    // -----------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------

    /// The transaction ID: double SHA-256 of the serialized bytes.
    ///
    /// Held in wire order; `to_string()` gives the reversed form explorers
    /// show.
    pub fn tx_id(&self) -> TxHash {
        TxHash::hash_of(&self.to_bytes())
    }

    /// A coinbase transaction has exactly one input, spending the null
    /// outpoint.
    pub fn is_coinbase(&self) -> bool {
        match self.inputs.as_slice() {
            [only] => only.previous_output.is_null(),
            _ => false,
        }
    }

    /// The outpoint of output `index` of this transaction.
    pub fn outpoint(&self, index: u32) -> OutPoint {
        OutPoint::new(self.tx_id(), index)
    }

    // -----------------------------------------------------------------
    // Signature hash
    // -----------------------------------------------------------------

    /// Compute the digest a signature over input `input_index` commits to.
    ///
    /// `utxo` is the output that input spends. A hash type carrying the
    /// fork-id bit selects the BIP143 digest, anything else the legacy one.
    ///
    /// # Returns
    /// The 32-byte digest, or `InvalidHashType` for an undefined base type.
    /// A fork-id digest fails with `InputIndexOutOfRange` for an index past
    /// the inputs; a legacy digest returns the historical constant one
    /// instead.
    pub fn signature_hash(
        &self,
        utxo: &TransactionOutput,
        input_index: usize,
        hash_type: SighashType,
    ) -> Result<[u8; 32], SignatureError> {
        if hash_type.has_fork_id() {
            sighash::forkid::signature_hash(self, utxo, input_index, hash_type)
        } else {
            sighash::legacy::signature_hash(self, utxo, input_index, hash_type)
        }
    }
}

fn capacity_hint(count: VarInt, remaining: usize) -> usize {
    usize::try_from(count.value()).map_or(remaining, |n| n.min(remaining))
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Transaction {
    /// The hex-encoded serialization.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
