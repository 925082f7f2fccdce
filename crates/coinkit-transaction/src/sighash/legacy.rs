//! The original signature hash, used without the fork-id bit.
//!
//! A copy of the transaction is trimmed according to the hash type,
//! serialized with the hash type appended, and double-SHA256 hashed.

use coinkit_primitives::hash::sha256d;
use coinkit_primitives::util::ByteWriter;
use coinkit_script::interpreter::SignatureError;
use coinkit_script::{Opcode, Script};
use tracing::{debug, warn};

use super::SighashType;
use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::transaction::Transaction;

/// The digest returned when there is nothing valid to sign: `0x01`
/// followed by 31 zero bytes, read as a little-endian 256-bit one.
///
/// Signatures over this value exist on chain, so it cannot become an error.
pub const SIGHASH_ONE: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

/// Compute the legacy signature hash for input `input_index`.
///
/// # Arguments
/// * `tx`          - The transaction being signed.
/// * `utxo`        - The output the input spends. Its locking script, minus
///                   any `OP_CODESEPARATOR`, stands in for the input's
///                   unlocking script.
/// * `input_index` - Index of the input being signed.
/// * `hash_type`   - The combined flags, without the fork-id bit.
///
/// # Returns
/// The 32-byte digest; [`SIGHASH_ONE`] when the index is past the inputs or
/// SINGLE has no output at that index; `InvalidHashType` for an undefined
/// base type.
pub fn signature_hash(
    tx: &Transaction,
    utxo: &TransactionOutput,
    input_index: usize,
    hash_type: SighashType,
) -> Result<[u8; 32], SignatureError> {
    hash_type.validate()?;

    if input_index >= tx.inputs.len() {
        warn!(
            input_index,
            inputs = tx.inputs.len(),
            "legacy signature hash for a missing input, returning one"
        );
        return Ok(SIGHASH_ONE);
    }
    if hash_type.is_single() && input_index >= tx.outputs.len() {
        warn!(
            input_index,
            outputs = tx.outputs.len(),
            "SIGHASH_SINGLE without a matching output, returning one"
        );
        return Ok(SIGHASH_ONE);
    }

    let mut writer = ByteWriter::with_capacity(256);
    trimmed_copy(tx, utxo, input_index, hash_type).write_to(&mut writer);
    writer.write_u32_le(hash_type.to_u32());

    debug!(input_index, hash_type = %hash_type, "computed legacy signature hash");
    Ok(sha256d(writer.as_bytes()))
}

/// The locking script with every `OP_CODESEPARATOR` removed.
///
/// A script that does not parse contributes an empty script code.
fn script_code(locking_script: &[u8]) -> Vec<u8> {
    match Script::parse(locking_script) {
        Ok(mut script) => script
            .delete_occurrences_of_opcode(Opcode::OpCodeSeparator)
            .bytes()
            .to_vec(),
        Err(_) => Vec::new(),
    }
}

/// The transaction as the signature sees it. `input_index` must be in range,
/// and for SINGLE so must the output at that index.
fn trimmed_copy(
    tx: &Transaction,
    utxo: &TransactionOutput,
    input_index: usize,
    hash_type: SighashType,
) -> Transaction {
    let zero_other_sequences = hash_type.is_none() || hash_type.is_single();

    let inputs = tx
        .inputs
        .iter()
        .enumerate()
        .filter(|(i, _)| !hash_type.anyone_can_pay() || *i == input_index)
        .map(|(i, input)| {
            if i == input_index {
                TransactionInput {
                    previous_output: input.previous_output,
                    signature_script: script_code(&utxo.locking_script),
                    sequence: input.sequence,
                }
            } else {
                TransactionInput {
                    previous_output: input.previous_output,
                    signature_script: Vec::new(),
                    sequence: if zero_other_sequences { 0 } else { input.sequence },
                }
            }
        })
        .collect();

    let outputs = if hash_type.is_none() {
        Vec::new()
    } else if hash_type.is_single() {
        // Earlier outputs become placeholders; later ones are dropped.
        let mut outputs = vec![TransactionOutput::default(); input_index];
        outputs.push(tx.outputs[input_index].clone());
        outputs
    } else {
        tx.outputs.clone()
    };

    Transaction {
        version: tx.version,
        inputs,
        outputs,
        lock_time: tx.lock_time,
    }
}
