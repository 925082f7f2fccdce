//! Script interpreter.
//!
//! Runs unlocking and locking scripts against an [`ExecutionContext`] and
//! decides whether a spend is authorized.
//!
//! # Architecture
//!
//! The interpreter does not depend on the transaction crate. Opcodes that
//! need the spending transaction (CHECKSIG, CHECKMULTISIG, CHECKLOCKTIMEVERIFY,
//! CHECKSEQUENCEVERIFY) reach it through the [`SigningContext`] trait, which
//! the transaction crate implements.
//!
//! # Example
//!
//! ```ignore
//! use coinkit_script::interpreter::{ExecutionContext, ScriptMachine};
//!
//! let mut context = ExecutionContext::new();
//! ScriptMachine::verify(&locking_script, &unlocking_script, &mut context)?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod machine;
pub mod scriptnum;

mod dispatch;
mod ops_arithmetic;
mod ops_crypto;
mod ops_flow;
mod ops_locktime;
mod ops_splice;
mod ops_stack;

pub use config::Config;
pub use context::ExecutionContext;
pub use error::{ScriptExecutionError, ScriptVerificationError, SignatureError};
pub use machine::ScriptMachine;
pub use scriptnum::ScriptNumber;

/// The spending transaction as seen from inside a script.
///
/// Implementors bind one transaction, the output it spends and the index of
/// the input being verified.
pub trait SigningContext {
    /// Check `signature` (DER followed by the hash-type byte) against
    /// `public_key` over the signature hash of the bound input.
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not match.
    fn verify_signature(&self, signature: &[u8], public_key: &[u8]) -> Result<bool, SignatureError>;

    /// The transaction's lock time.
    fn lock_time(&self) -> u32;

    /// The transaction's version.
    fn tx_version(&self) -> u32;

    /// The sequence number of the input being verified.
    fn input_sequence(&self) -> u32;
}
