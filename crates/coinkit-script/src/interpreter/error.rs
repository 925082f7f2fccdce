//! Interpreter error types.
//!
//! Execution errors and verification failures are kept apart: the first
//! means a script could not be run to completion, the second means it ran
//! and the spend is not authorized.

use crate::ScriptParseError;

/// Signature and hash-type problems met while checking a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("SigData is empty.")]
    EmptySignature,

    /// The hash-type byte names no known base type.
    #[error("invalid sighash type 0x{0:02x}")]
    InvalidHashType(u8),

    #[error("input index {index} out of range for {count} inputs")]
    InputIndexOutOfRange { index: usize, count: usize },

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The signature bytes are not a parseable DER signature.
    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),
}

/// A script that could not be executed to the end.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptExecutionError {
    #[error("Operation requires {0} items on stack.")]
    OpcodeRequiresItemsOnStack(usize),

    /// A numeric operand is wider than four bytes.
    #[error("Invalid bignum: numeric operand exceeds 4 bytes.")]
    InvalidBignum,

    #[error("Attempt to execute disabled opcode {0}.")]
    DisabledOpcode(&'static str),

    /// The script is larger than the configured maximum.
    #[error("Script is too large: {0} bytes.")]
    ScriptTooLarge(usize),

    #[error("{0}")]
    Error(String),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl ScriptExecutionError {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        ScriptExecutionError::Error(message.into())
    }
}

/// Why a spend failed to verify.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptVerificationError {
    #[error("Stack is empty after script execution.")]
    EmptyStack,

    #[error("Last item on the stack is false.")]
    LastItemFalse,

    #[error("Input script for P2SH spending must be literals-only.")]
    P2shNotDataOnly,

    #[error("could not deserialize P2SH redeem script: {0}")]
    P2shDeserialize(ScriptParseError),

    #[error(transparent)]
    Parse(#[from] ScriptParseError),

    #[error(transparent)]
    Execution(#[from] ScriptExecutionError),

    #[error("input index {index} out of range for {count} inputs")]
    InputIndexOutOfRange { index: usize, count: usize },
}
