//! Hashing and signature-checking operations.

use coinkit_primitives::hash;

use super::context::ExecutionContext;
use super::error::{ScriptExecutionError, SignatureError};
use super::SigningContext;

pub(crate) enum HashKind {
    Ripemd160,
    Sha1,
    Sha256,
    Hash160,
    Hash256,
}

impl HashKind {
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashKind::Ripemd160 => hash::ripemd160(data).to_vec(),
            HashKind::Sha1 => hash::sha1(data).to_vec(),
            HashKind::Sha256 => hash::sha256(data).to_vec(),
            HashKind::Hash160 => hash::hash160(data).to_vec(),
            HashKind::Hash256 => hash::sha256d(data).to_vec(),
        }
    }
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn op_hash(&mut self, kind: HashKind) -> Result<(), ScriptExecutionError> {
        let data = self.pop_data()?;
        self.stack.push(kind.digest(&data));
        Ok(())
    }

    pub(crate) fn require_signing_context(&self) -> Result<&'a dyn SigningContext, ScriptExecutionError> {
        self.signing_context().ok_or_else(|| {
            ScriptExecutionError::msg("The transaction or the utxo to verify is not set.")
        })
    }

    /// sig pubkey -> bool
    ///
    /// An empty signature, or one that cannot be parsed, is an error rather
    /// than a `false` result.
    pub(crate) fn op_checksig(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let public_key = self.pop_data()?;
        let signature = self.pop_data()?;

        let signing = self.require_signing_context()?;
        if signature.is_empty() {
            return Err(SignatureError::EmptySignature.into());
        }
        let valid = signing.verify_signature(&signature, &public_key)?;
        self.push_bool(valid);
        Ok(())
    }

    pub(crate) fn op_checksigverify(&mut self) -> Result<(), ScriptExecutionError> {
        self.op_checksig()?;
        self.verify_top("OP_CHECKSIGVERIFY")
    }

    /// dummy sig1..sigM M key1..keyN N -> bool
    ///
    /// Signatures must appear in the same order as the keys they match.
    /// Each key is tried once against the oldest unmatched signature, and
    /// the check gives up as soon as too few keys remain. Malformed keys or
    /// signatures count as a mismatch. The dummy element is consumed and
    /// otherwise ignored.
    pub(crate) fn op_checkmultisig(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(1)?;
        let raw_keys = self.number(-1)?;
        let max_keys = self.config().max_pub_keys_per_multisig;
        let n_keys = usize::try_from(raw_keys)
            .ok()
            .filter(|&n| n <= max_keys)
            .ok_or_else(|| {
                ScriptExecutionError::msg(format!(
                    "Invalid number of keys for OP_CHECKMULTISIG: {}.",
                    raw_keys
                ))
            })?;
        self.increment_op_count(n_keys)?;
        self.stack.pop();

        self.assert_stack_height(n_keys + 1)?;
        let public_keys = self.stack.split_off(self.stack.len() - n_keys);

        let raw_sigs = self.number(-1)?;
        let n_sigs = usize::try_from(raw_sigs)
            .ok()
            .filter(|&n| n <= n_keys)
            .ok_or_else(|| {
                ScriptExecutionError::msg(format!(
                    "Invalid number of signatures for OP_CHECKMULTISIG: {}.",
                    raw_sigs
                ))
            })?;
        self.stack.pop();

        // The signatures plus the dummy element.
        self.assert_stack_height(n_sigs + 1)?;
        let signatures = self.stack.split_off(self.stack.len() - n_sigs);
        self.stack.pop();

        let signing = self.require_signing_context()?;
        let (mut key, mut sig) = (0, 0);
        let mut success = true;
        while success && sig < signatures.len() {
            if signing
                .verify_signature(&signatures[sig], &public_keys[key])
                .unwrap_or(false)
            {
                sig += 1;
            }
            key += 1;
            if public_keys.len() - key < signatures.len() - sig {
                success = false;
            }
        }

        self.push_bool(success);
        Ok(())
    }

    pub(crate) fn op_checkmultisigverify(&mut self) -> Result<(), ScriptExecutionError> {
        self.op_checkmultisig()?;
        self.verify_top("OP_CHECKMULTISIGVERIFY")
    }
}
