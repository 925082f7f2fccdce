//! Transaction output: a value and the script that locks it.

use coinkit_primitives::util::{ByteReader, ByteWriter};
use coinkit_script::{Script, ScriptParseError};

use crate::TransactionError;

/// A single output of a transaction, and the UTXO shape the signature
/// engines and verifier consume.
///
/// # Wire format
///
/// | Field          | Size          |
/// |----------------|---------------|
/// | value          | 8 bytes (LE)  |
/// | script length  | VarInt        |
/// | locking_script | variable      |
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionOutput {
    /// Amount locked, in the chain's smallest unit.
    pub value: u64,

    /// Raw locking script (scriptPubKey).
    pub locking_script: Vec<u8>,
}

impl TransactionOutput {
    pub fn new(value: u64, locking_script: &Script) -> Self {
        TransactionOutput {
            value,
            locking_script: locking_script.bytes().to_vec(),
        }
    }

    /// Parse the locking script.
    pub fn script(&self) -> Result<Script, ScriptParseError> {
        Script::parse(&self.locking_script)
    }

    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let value = reader.read_u64_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading output value: {}", e))
        })?;
        let locking_script = reader
            .read_var_bytes()
            .map_err(|e| {
                TransactionError::SerializationError(format!("reading locking script: {}", e))
            })?
            .to_vec();
        Ok(TransactionOutput {
            value,
            locking_script,
        })
    }

    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u64_le(self.value);
        writer.write_var_bytes(&self.locking_script);
    }

    /// The wire form, which is also what `hashOutputs` commits to.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(8 + 5 + self.locking_script.len());
        self.write_to(&mut writer);
        writer.into_bytes()
    }
}
