//! Script templates for signing transaction inputs.
//!
//! [`sign_input`] produces the signature any script template pushes;
//! [`p2pkh`] builds the standard pay-to-public-key-hash scripts around it.

pub mod p2pkh;

use coinkit_primitives::ec::PrivateKey;
use coinkit_script::Script;

use crate::output::TransactionOutput;
use crate::sighash::SighashType;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Trait for templates that produce unlocking scripts.
pub trait UnlockingScriptTemplate {
    /// Produce the unlocking script for input `input_index` of `tx`, which
    /// spends `utxo`.
    fn sign(
        &self,
        tx: &Transaction,
        utxo: &TransactionOutput,
        input_index: usize,
    ) -> Result<Script, TransactionError>;
}

/// Sign input `input_index` of `tx`, which spends `utxo`.
///
/// # Returns
/// The DER signature followed by the hash type byte, ready to be pushed by
/// an unlocking script. Fails with `InvalidTransaction` for an index past
/// the inputs and with `SigningError` for SINGLE without a matching output,
/// so the legacy "one" digest is never signed.
pub fn sign_input(
    tx: &Transaction,
    utxo: &TransactionOutput,
    input_index: usize,
    private_key: &PrivateKey,
    hash_type: SighashType,
) -> Result<Vec<u8>, TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }
    if hash_type.is_single() && input_index >= tx.outputs.len() {
        return Err(TransactionError::SigningError(format!(
            "SIGHASH_SINGLE needs an output at index {}",
            input_index
        )));
    }

    let sig_hash = tx.signature_hash(utxo, input_index, hash_type)?;
    let signature = private_key.sign(&sig_hash)?;

    let mut sig_buf = signature.to_der();
    sig_buf.push(hash_type.to_byte());
    Ok(sig_buf)
}
