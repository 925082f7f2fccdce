/// Raised by the chunk parser when raw script bytes cannot be split into
/// chunks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptParseError {
    /// An opcode or push-length prefix runs past the end of the data.
    #[error("script truncated at offset {offset}")]
    Truncated { offset: usize },

    /// A push claims more bytes than remain in the script.
    #[error("push of {length} bytes at offset {offset} runs past the end of the script")]
    PushOutOfBounds { offset: usize, length: usize },
}

/// Alias kept for callers that think of parse failures as chunk errors.
pub type ChunkError = ScriptParseError;

/// Error types for building and converting scripts.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// PUSHDATA1/2/4 and INVALIDOPCODE may not be appended without an operand.
    #[error("{0} cannot be appended as a bare opcode")]
    BareOpcode(&'static str),

    /// Data pushes must carry at least one byte; use OP_0 for empty.
    #[error("cannot append empty data")]
    EmptyData,

    /// The requested push encoding cannot hold the data.
    #[error("{encoding} cannot encode {length} bytes")]
    EncodingTooSmall { encoding: &'static str, length: usize },

    /// Script is empty when a non-empty script was expected.
    #[error("script is empty")]
    EmptyScript,

    /// Multisig parameters outside 1 <= required <= keys <= 16.
    #[error("invalid multisig: {required} of {keys}")]
    InvalidMultisig { required: usize, keys: usize },

    /// A mnemonic token that is neither an opcode name nor hex data.
    #[error("unknown script token '{0}'")]
    UnknownToken(String),

    /// Raw bytes failed to parse.
    #[error(transparent)]
    Parse(#[from] ScriptParseError),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}
