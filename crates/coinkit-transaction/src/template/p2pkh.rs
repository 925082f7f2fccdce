//! Pay-to-Public-Key-Hash (P2PKH) script template.
//!
//! Locking scripts are `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`,
//! unlocking scripts are `<sig> <pubkey>`.

use coinkit_primitives::ec::{PrivateKey, PublicKey};
use coinkit_script::Script;

use crate::output::TransactionOutput;
use crate::sighash::SighashType;
use crate::template::{sign_input, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// The 25-byte P2PKH locking script for `pub_key_hash`.
pub fn lock(pub_key_hash: &[u8; 20]) -> Script {
    Script::build_public_key_hash_out(pub_key_hash)
}

/// A P2PKH unlocker signing with `private_key` under `hash_type`.
///
/// The compressed public key is pushed; use
/// [`with_uncompressed_key`](P2PKH::with_uncompressed_key) for outputs
/// locked to the hash of the uncompressed form.
pub fn unlock(private_key: PrivateKey, hash_type: SighashType) -> P2PKH {
    let public_key = private_key.pub_key();
    P2PKH {
        private_key,
        public_key,
        hash_type,
    }
}

/// P2PKH signing template holding a private key and hash type.
pub struct P2PKH {
    private_key: PrivateKey,
    public_key: PublicKey,
    hash_type: SighashType,
}

impl P2PKH {
    pub fn with_uncompressed_key(mut self) -> Self {
        self.public_key = self.public_key.uncompressed();
        self
    }

    /// The public key the unlocking script pushes.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl UnlockingScriptTemplate for P2PKH {
    /// `<DER signature ‖ hash type> <public key>`.
    fn sign(
        &self,
        tx: &Transaction,
        utxo: &TransactionOutput,
        input_index: usize,
    ) -> Result<Script, TransactionError> {
        let signature = sign_input(tx, utxo, input_index, &self.private_key, self.hash_type)?;

        let mut script = Script::new();
        script
            .append_data(&signature)?
            .append_data(&self.public_key.to_bytes())?;
        Ok(script)
    }
}
