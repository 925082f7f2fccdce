/// coinkit primitives - hashing, secp256k1 keys and wire encoding.
///
/// These are the external collaborators the script engine calls into:
/// - Hash functions (SHA-1, SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - Chain hash type for transaction identification
/// - secp256k1 private keys, public keys and DER signatures
/// - Variable-length integers and little-endian readers/writers

pub mod hash;
pub mod chainhash;
pub mod util;
pub mod ec;

mod error;
pub use error::PrimitivesError;
