use coinkit_script::interpreter::SignatureError;

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Bytes or hex that do not decode to a transaction.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// The transaction cannot be used as asked (e.g. an input index past the end).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("signing error: {0}")]
    SigningError(String),
    /// An underlying script error (forwarded from `coinkit-script`).
    #[error("script error: {0}")]
    Script(#[from] coinkit_script::ScriptError),
    /// An underlying primitives error (forwarded from `coinkit-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] coinkit_primitives::PrimitivesError),
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),
}
