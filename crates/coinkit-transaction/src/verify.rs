//! Verifying a transaction input against the output it spends.

use coinkit_primitives::ec::{PublicKey, Signature};
use coinkit_script::interpreter::{
    ExecutionContext, ScriptMachine, ScriptVerificationError, SignatureError, SigningContext,
};
use coinkit_script::Script;
use tracing::debug;

use crate::input::DEFAULT_SEQUENCE_NUMBER;
use crate::output::TransactionOutput;
use crate::sighash::SighashType;
use crate::transaction::Transaction;

/// One input of a transaction, bound to the output it spends, as seen by
/// the signature and lock-time opcodes.
#[derive(Clone, Copy, Debug)]
pub struct TxSigningContext<'a> {
    tx: &'a Transaction,
    utxo: &'a TransactionOutput,
    input_index: usize,
}

impl<'a> TxSigningContext<'a> {
    /// Bind input `input_index` of `tx`, which spends `utxo`.
    ///
    /// # Returns
    /// The context, or `InputIndexOutOfRange` when `tx` has no such input.
    pub fn new(
        tx: &'a Transaction,
        utxo: &'a TransactionOutput,
        input_index: usize,
    ) -> Result<Self, SignatureError> {
        if input_index >= tx.inputs.len() {
            return Err(SignatureError::InputIndexOutOfRange {
                index: input_index,
                count: tx.inputs.len(),
            });
        }
        Ok(TxSigningContext {
            tx,
            utxo,
            input_index,
        })
    }

    pub fn tx(&self) -> &'a Transaction {
        self.tx
    }

    pub fn utxo(&self) -> &'a TransactionOutput {
        self.utxo
    }

    pub fn input_index(&self) -> usize {
        self.input_index
    }
}

impl SigningContext for TxSigningContext<'_> {
    fn verify_signature(&self, signature: &[u8], public_key: &[u8]) -> Result<bool, SignatureError> {
        let (&hash_type, der) = signature.split_last().ok_or(SignatureError::EmptySignature)?;
        let hash_type = SighashType::from_byte(hash_type);

        let sig = Signature::from_der(der).map_err(|e| SignatureError::InvalidSignature(e.to_string()))?;
        let key =
            PublicKey::from_bytes(public_key).map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;

        let digest = self.tx.signature_hash(self.utxo, self.input_index, hash_type)?;
        Ok(key.verify(&digest, &sig))
    }

    fn lock_time(&self) -> u32 {
        self.tx.lock_time
    }

    fn tx_version(&self) -> u32 {
        self.tx.version
    }

    /// A missing input reads as final, which fails every lock-time check.
    fn input_sequence(&self) -> u32 {
        self.tx
            .inputs
            .get(self.input_index)
            .map_or(DEFAULT_SEQUENCE_NUMBER, |input| input.sequence)
    }
}

/// Decide whether input `input_index` of `tx` may spend `utxo`.
///
/// Runs the input's unlocking script and `utxo`'s locking script, with
/// P2SH evaluated when `block_timestamp` is past its activation.
///
/// # Returns
/// `Ok(true)` when the spend is authorized, otherwise the reason it is
/// not. Scripts that do not parse fail with `Parse`.
pub fn verify_transaction(
    tx: &Transaction,
    input_index: usize,
    utxo: &TransactionOutput,
    block_timestamp: u32,
) -> Result<bool, ScriptVerificationError> {
    let signing = TxSigningContext::new(tx, utxo, input_index).map_err(|_| {
        ScriptVerificationError::InputIndexOutOfRange {
            index: input_index,
            count: tx.inputs.len(),
        }
    })?;

    let unlock = Script::parse(&tx.inputs[input_index].signature_script)?;
    let lock = Script::parse(&utxo.locking_script)?;

    debug!(
        txid = %tx.tx_id(),
        input_index,
        "verifying transaction input"
    );
    let mut context = ExecutionContext::with_signing_context(&signing).with_block_timestamp(block_timestamp);
    ScriptMachine::verify(&lock, &unlock, &mut context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{OutPoint, TransactionInput};
    use coinkit_primitives::chainhash::TxHash;

    fn asm(s: &str) -> Script {
        Script::from_asm(s).expect("valid asm")
    }

    #[test]
    fn test_new_rejects_missing_input() {
        let tx = Transaction::new();
        let utxo = TransactionOutput::default();
        assert_eq!(
            TxSigningContext::new(&tx, &utxo, 3).unwrap_err(),
            SignatureError::InputIndexOutOfRange { index: 3, count: 0 }
        );
    }

    /// Lock-time opcodes fail cleanly when the bound input does not exist.
    #[test]
    fn test_lock_time_with_missing_input() {
        let tx = Transaction::new();
        let utxo = TransactionOutput::default();
        let signing = TxSigningContext {
            tx: &tx,
            utxo: &utxo,
            input_index: 3,
        };
        assert_eq!(signing.input_sequence(), DEFAULT_SEQUENCE_NUMBER);

        let mut context = ExecutionContext::with_signing_context(&signing);
        let result = ScriptMachine::verify(&asm("OP_CHECKLOCKTIMEVERIFY"), &asm("OP_0"), &mut context);
        assert!(matches!(result, Err(ScriptVerificationError::Execution(_))));
    }

    #[test]
    fn test_input_sequence() {
        let mut tx = Transaction::new();
        let mut input = TransactionInput::new(OutPoint::new(TxHash::new([7; 32]), 1));
        input.sequence = 42;
        tx.inputs.push(input);
        tx.lock_time = 500;
        let utxo = TransactionOutput::default();

        let signing = TxSigningContext::new(&tx, &utxo, 0).unwrap();
        assert_eq!(signing.input_sequence(), 42);
        assert_eq!(signing.lock_time(), 500);
        assert_eq!(signing.input_index(), 0);
    }
}
