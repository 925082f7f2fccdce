//! Transactions for the coinkit script engine.
//!
//! Wire (de)serialization, the legacy and fork-id signature hashes, the
//! transaction-backed [`SigningContext`](coinkit_script::interpreter::SigningContext)
//! used by CHECKSIG, input verification, and a P2PKH signing template.

pub mod input;
pub mod output;
pub mod sighash;
pub mod template;
pub mod transaction;
pub mod verify;

mod error;
pub use error::TransactionError;
pub use input::{OutPoint, TransactionInput};
pub use output::TransactionOutput;
pub use sighash::SighashType;
pub use transaction::Transaction;
pub use verify::{verify_transaction, TxSigningContext};

#[cfg(test)]
mod tests;
