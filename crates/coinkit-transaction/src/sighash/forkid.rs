//! BIP143 signature hash, used by BCH with the fork-id bit.
//!
//! Commits to the value being spent and hashes the shared parts of the
//! transaction once, so signing many inputs stays linear.

use coinkit_primitives::hash::sha256d;
use coinkit_primitives::util::ByteWriter;
use coinkit_script::interpreter::SignatureError;
use tracing::debug;

use super::SighashType;
use crate::input::OUTPOINT_SIZE;
use crate::output::TransactionOutput;
use crate::transaction::Transaction;

/// Compute the BIP143 signature hash for input `input_index`.
///
/// # Arguments
/// * `tx`          - The transaction being signed.
/// * `utxo`        - The output the input spends; its locking script is the
///                   scriptCode and its value is committed to.
/// * `input_index` - Index of the input being signed.
/// * `hash_type`   - The combined flags, normally with the fork-id bit.
///
/// # Returns
/// The 32-byte double-SHA256 of the preimage, or `InputIndexOutOfRange` /
/// `InvalidHashType`.
pub fn signature_hash(
    tx: &Transaction,
    utxo: &TransactionOutput,
    input_index: usize,
    hash_type: SighashType,
) -> Result<[u8; 32], SignatureError> {
    let preimage = calc_preimage(tx, utxo, input_index, hash_type)?;
    debug!(input_index, hash_type = %hash_type, "computed fork-id signature hash");
    Ok(sha256d(&preimage))
}

/// The bytes hashed by [`signature_hash`]:
///
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes)
/// 3. hashSequence (32 bytes)
/// 4. outpoint of the signed input (32+4 bytes)
/// 5. scriptCode (varint + script)
/// 6. value of the spent output (8 bytes LE)
/// 7. nSequence of the signed input (4 bytes LE)
/// 8. hashOutputs (32 bytes)
/// 9. nLocktime (4 bytes LE)
/// 10. hash type (4 bytes LE)
pub fn calc_preimage(
    tx: &Transaction,
    utxo: &TransactionOutput,
    input_index: usize,
    hash_type: SighashType,
) -> Result<Vec<u8>, SignatureError> {
    hash_type.validate()?;
    let input = tx
        .inputs
        .get(input_index)
        .ok_or(SignatureError::InputIndexOutOfRange {
            index: input_index,
            count: tx.inputs.len(),
        })?;

    let hash_prevouts = if hash_type.anyone_can_pay() {
        [0u8; 32]
    } else {
        hash_prevouts(tx)
    };

    let hash_sequence = if hash_type.anyone_can_pay() || hash_type.is_single() || hash_type.is_none() {
        [0u8; 32]
    } else {
        hash_sequence(tx)
    };

    let hash_outputs = if !hash_type.is_single() && !hash_type.is_none() {
        hash_outputs(tx, None)
    } else if hash_type.is_single() && input_index < tx.outputs.len() {
        hash_outputs(tx, Some(input_index))
    } else {
        [0u8; 32]
    };

    let mut writer = ByteWriter::with_capacity(160 + utxo.locking_script.len());
    writer.write_u32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    input.previous_output.write_to(&mut writer);
    writer.write_var_bytes(&utxo.locking_script);
    writer.write_u64_le(utxo.value);
    writer.write_u32_le(input.sequence);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(hash_type.to_u32());

    Ok(writer.into_bytes())
}

/// Double-SHA256 of every input outpoint.
pub fn hash_prevouts(tx: &Transaction) -> [u8; 32] {
    let mut writer = ByteWriter::with_capacity(tx.inputs.len() * OUTPOINT_SIZE);
    for input in &tx.inputs {
        input.previous_output.write_to(&mut writer);
    }
    sha256d(writer.as_bytes())
}

/// Double-SHA256 of every input sequence number.
pub fn hash_sequence(tx: &Transaction) -> [u8; 32] {
    let mut writer = ByteWriter::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        writer.write_u32_le(input.sequence);
    }
    sha256d(writer.as_bytes())
}

/// Double-SHA256 of the serialized outputs: all of them, or only the one
/// at `single`.
pub fn hash_outputs(tx: &Transaction, single: Option<usize>) -> [u8; 32] {
    let mut writer = ByteWriter::new();
    match single {
        Some(index) => {
            if let Some(output) = tx.outputs.get(index) {
                output.write_to(&mut writer);
            }
        }
        None => {
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
    }
    sha256d(writer.as_bytes())
}
