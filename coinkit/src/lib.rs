#![deny(missing_docs)]

//! coinkit - Bitcoin / Bitcoin Cash script execution engine.
//!
//! Re-exports the workspace crates for single-crate usage.
//!
//! ```ignore
//! use coinkit::transaction::{verify_transaction, Transaction};
//!
//! let tx = Transaction::from_hex(raw_tx)?;
//! let authorized = verify_transaction(&tx, 0, &spent_output, block_timestamp)?;
//! ```

/// Hashes, chain hashes, wire helpers and secp256k1 keys.
pub use coinkit_primitives as primitives;
/// Opcodes, scripts and the script interpreter.
pub use coinkit_script as script;
/// Transactions, signature hashes and input verification.
pub use coinkit_transaction as transaction;

/// The types most callers need.
pub mod prelude {
    pub use coinkit_script::interpreter::{ExecutionContext, ScriptMachine};
    pub use coinkit_script::{Opcode, Script};
    pub use coinkit_transaction::{verify_transaction, SighashType, Transaction, TransactionOutput};
}
