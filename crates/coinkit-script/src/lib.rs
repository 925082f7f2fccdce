/// coinkit script - parsing, building and executing Bitcoin / Bitcoin Cash scripts.
///
/// Provides the opcode table, the chunk parser, the `Script` builder and
/// classifiers, and an interpreter that verifies unlocking scripts against
/// locking scripts (including P2SH).

pub mod opcodes;
pub mod chunk;
pub mod script;
pub mod interpreter;

mod error;
pub use error::{ChunkError, ScriptError, ScriptParseError};
pub use script::{MultisigRequirements, Script};
pub use chunk::{PushEncoding, ScriptChunk};
pub use opcodes::Opcode;
