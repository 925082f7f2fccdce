//! Script value type: a parsed chunk list plus its canonical byte form.
//!
//! Both views are kept side by side. Every mutating builder method rebuilds
//! the byte form from the chunks before returning, so the two never drift.

use std::fmt;

use coinkit_primitives::ec::PublicKey;
use coinkit_primitives::hash::hash160;

use crate::chunk::{self, PushEncoding, ScriptChunk};
use crate::opcodes::*;
use crate::{ScriptError, ScriptParseError};

/// The `m`-of-`n` parameters of a bare multisig script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigRequirements {
    pub required: usize,
    pub public_keys: Vec<PublicKey>,
}

/// A Bitcoin script.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Script {
    chunks: Vec<ScriptChunk>,
    bytes: Vec<u8>,
}

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new empty script.
    pub fn new() -> Self {
        Script::default()
    }

    /// Parse raw script bytes.
    ///
    /// # Arguments
    /// * `bytes` - Raw script bytes.
    ///
    /// # Returns
    /// The parsed `Script`, or the chunk error for a truncated push.
    pub fn parse(bytes: &[u8]) -> Result<Self, ScriptParseError> {
        let chunks = chunk::parse(bytes)?;
        Ok(Script {
            chunks,
            bytes: bytes.to_vec(),
        })
    }

    /// Parse a hex-encoded script.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        Ok(Script::parse(&hex::decode(hex_str)?)?)
    }

    /// Build a script from chunks.
    ///
    /// The chunks are serialized and parsed again, so the result always
    /// holds the chunk list its own bytes decode to.
    pub fn from_chunks(chunks: &[ScriptChunk]) -> Result<Self, ScriptError> {
        Ok(Script::parse(&chunk::serialize(chunks))?)
    }

    /// Parse a mnemonic string such as `"OP_DUP OP_HASH160 <hex> ..."`.
    ///
    /// Opcode names (aliases included) become opcodes, `OP_0` becomes an
    /// empty push and any other token must be hex data.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            if let Some(op) = Opcode::from_name(token) {
                script.append(op)?;
            } else {
                let data = hex::decode(token)
                    .map_err(|_| ScriptError::UnknownToken(token.to_string()))?;
                script.append_data(&data)?;
            }
        }
        Ok(script)
    }

    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`.
    pub fn build_public_key_hash_out(pub_key_hash: &[u8; 20]) -> Self {
        Script::from_parts(vec![
            ScriptChunk::Opcode(Opcode::OpDup),
            ScriptChunk::Opcode(Opcode::OpHash160),
            ScriptChunk::push(pub_key_hash.to_vec()),
            ScriptChunk::Opcode(Opcode::OpEqualVerify),
            ScriptChunk::Opcode(Opcode::OpCheckSig),
        ])
    }

    /// `OP_<m> <key>... OP_<n> OP_CHECKMULTISIG`.
    ///
    /// # Returns
    /// `InvalidMultisig` unless `1 <= required <= keys.len() <= 16`.
    pub fn build_multisig(required: usize, keys: &[PublicKey]) -> Result<Self, ScriptError> {
        let invalid = || ScriptError::InvalidMultisig {
            required,
            keys: keys.len(),
        };
        if required == 0 || required > keys.len() {
            return Err(invalid());
        }
        let m = u8::try_from(required).ok().and_then(Opcode::small_integer).ok_or_else(invalid)?;
        let n = u8::try_from(keys.len())
            .ok()
            .filter(|&n| n <= 16)
            .and_then(Opcode::small_integer)
            .ok_or_else(invalid)?;

        let mut chunks = Vec::with_capacity(keys.len() + 3);
        chunks.push(ScriptChunk::Opcode(m));
        chunks.extend(keys.iter().map(|key| ScriptChunk::push(key.to_bytes())));
        chunks.push(ScriptChunk::Opcode(n));
        chunks.push(ScriptChunk::Opcode(Opcode::OpCheckMultiSig));
        Ok(Script::from_parts(chunks))
    }

    /// The P2SH locking script committing to this script:
    /// `OP_HASH160 <hash160(bytes)> OP_EQUAL`.
    pub fn to_p2sh(&self) -> Script {
        Script::from_parts(vec![
            ScriptChunk::Opcode(Opcode::OpHash160),
            ScriptChunk::push(hash160(&self.bytes).to_vec()),
            ScriptChunk::Opcode(Opcode::OpEqual),
        ])
    }

    // Chunks produced here are already canonical.
    fn from_parts(chunks: Vec<ScriptChunk>) -> Self {
        let bytes = chunk::serialize(&chunks);
        Script { chunks, bytes }
    }

    fn rebuild(&mut self) {
        self.bytes = chunk::serialize(&self.chunks);
    }

    // -----------------------------------------------------------------------
    // Builder
    // -----------------------------------------------------------------------

    /// Append a bare opcode.
    ///
    /// `OP_0` is appended as an empty push. The PUSHDATA opcodes, direct
    /// pushes and `OP_INVALIDOPCODE` need an operand and are rejected.
    pub fn append(&mut self, op: Opcode) -> Result<&mut Self, ScriptError> {
        match op {
            Opcode::Op0 => self.chunks.push(ScriptChunk::push(Vec::new())),
            Opcode::PushData1 | Opcode::PushData2 | Opcode::PushData4 | Opcode::OpInvalidOpcode => {
                return Err(ScriptError::BareOpcode(op.name()))
            }
            Opcode::PushBytes(_) => return Err(ScriptError::BareOpcode(op.name())),
            _ => self.chunks.push(ScriptChunk::Opcode(op)),
        }
        self.rebuild();
        Ok(self)
    }

    /// Append a data push using the most compact encoding.
    pub fn append_data(&mut self, data: &[u8]) -> Result<&mut Self, ScriptError> {
        self.append_data_with_encoding(data, PushEncoding::minimal_for(data.len()))
    }

    /// Append a data push using an explicit encoding.
    pub fn append_data_with_encoding(
        &mut self,
        data: &[u8],
        encoding: PushEncoding,
    ) -> Result<&mut Self, ScriptError> {
        if data.is_empty() {
            return Err(ScriptError::EmptyData);
        }
        self.chunks.push(ScriptChunk::push_with_encoding(data, encoding)?);
        self.rebuild();
        Ok(self)
    }

    /// Append every chunk of `other`.
    pub fn append_script(&mut self, other: &Script) -> Result<&mut Self, ScriptError> {
        if other.is_empty() {
            return Err(ScriptError::EmptyScript);
        }
        self.chunks.extend(other.chunks.iter().cloned());
        self.rebuild();
        Ok(self)
    }

    /// Remove every push of exactly `data`. Empty `data` removes nothing.
    pub fn delete_occurrences_of_data(&mut self, data: &[u8]) -> &mut Self {
        if !data.is_empty() {
            self.chunks.retain(|c| c.pushed_data() != Some(data));
            self.rebuild();
        }
        self
    }

    /// Remove every chunk whose leading opcode is `op`.
    pub fn delete_occurrences_of_opcode(&mut self, op: Opcode) -> &mut Self {
        self.chunks.retain(|c| c.opcode() != op);
        self.rebuild();
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn chunks(&self) -> &[ScriptChunk] {
        &self.chunks
    }

    /// The chunk at `index`; negative indices count back from the end.
    pub fn chunk(&self, index: isize) -> Option<&ScriptChunk> {
        let len = self.chunks.len() as isize;
        let at = if index < 0 { len + index } else { index };
        if (0..len).contains(&at) {
            self.chunks.get(at as usize)
        } else {
            None
        }
    }

    pub fn opcode(&self, index: isize) -> Option<Opcode> {
        self.chunk(index).map(ScriptChunk::opcode)
    }

    pub fn pushed_data(&self, index: isize) -> Option<&[u8]> {
        self.chunk(index).and_then(ScriptChunk::pushed_data)
    }

    /// Chunks from `index` to the end. An index past the end gives an empty
    /// script.
    pub fn sub_script_from(&self, index: usize) -> Script {
        let start = index.min(self.chunks.len());
        Script::from_parts(self.chunks[start..].to_vec())
    }

    /// Chunks before `index`.
    pub fn sub_script_to(&self, index: usize) -> Script {
        let end = index.min(self.chunks.len());
        Script::from_parts(self.chunks[..end].to_vec())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Length of the serialized script in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`.
    pub fn is_pay_to_public_key_hash(&self) -> bool {
        match self.chunks.as_slice() {
            [ScriptChunk::Opcode(Opcode::OpDup), ScriptChunk::Opcode(Opcode::OpHash160), hash, ScriptChunk::Opcode(Opcode::OpEqualVerify), ScriptChunk::Opcode(Opcode::OpCheckSig)] => {
                is_implicit_push_of(hash, 20)
            }
            _ => false,
        }
    }

    /// `OP_HASH160 <20 bytes> OP_EQUAL`.
    pub fn is_pay_to_script_hash(&self) -> bool {
        is_p2sh_pattern(&self.chunks)
    }

    /// True when the last three chunks form a P2SH pattern.
    pub fn ends_with_pay_to_script_hash(&self) -> bool {
        self.chunks.len() >= 3 && is_p2sh_pattern(&self.chunks[self.chunks.len() - 3..])
    }

    /// `<pubkey> OP_CHECKSIG`.
    pub fn is_public_key_script(&self) -> bool {
        match self.chunks.as_slice() {
            [key, ScriptChunk::Opcode(Opcode::OpCheckSig)] => {
                key.pushed_data().map_or(false, |d| d.len() > 1)
            }
            _ => false,
        }
    }

    /// `OP_<m> <key>... OP_<n> OP_CHECKMULTISIG` with `0 < m <= n` and
    /// exactly `n` key pushes.
    pub fn is_multisig(&self) -> bool {
        self.multisig_shape().is_some()
    }

    /// A multisig script with at most three keys.
    pub fn is_standard_multisig(&self) -> bool {
        self.multisig_shape().map_or(false, |(_, n)| n <= 3)
    }

    /// The multisig parameters, when every key push is a valid public key.
    pub fn multisig_requirements(&self) -> Option<MultisigRequirements> {
        let (required, n) = self.multisig_shape()?;
        let public_keys = self.chunks[1..=n]
            .iter()
            .map(|c| c.pushed_data().and_then(|d| PublicKey::from_bytes(d).ok()))
            .collect::<Option<Vec<_>>>()?;
        Some(MultisigRequirements {
            required,
            public_keys,
        })
    }

    fn multisig_shape(&self) -> Option<(usize, usize)> {
        let len = self.chunks.len();
        if len < 4 || self.chunks[len - 1] != ScriptChunk::Opcode(Opcode::OpCheckMultiSig) {
            return None;
        }
        let m = self.chunks[0].opcode().as_small_integer()? as usize;
        let n = self.chunks[len - 2].opcode().as_small_integer()? as usize;
        if m == 0 || m > n || len != n + 3 {
            return None;
        }
        if !self.chunks[1..=n].iter().all(ScriptChunk::is_push) {
            return None;
        }
        Some((m, n))
    }

    /// `OP_RETURN <data>`.
    pub fn is_standard_op_return(&self) -> bool {
        self.standard_op_return_data().is_some()
    }

    /// The payload of an `OP_RETURN <data>` script.
    pub fn standard_op_return_data(&self) -> Option<&[u8]> {
        match self.chunks.as_slice() {
            [ScriptChunk::Opcode(Opcode::OpReturn), data] => data.pushed_data(),
            _ => None,
        }
    }

    /// Any of the standard output shapes.
    pub fn is_standard(&self) -> bool {
        self.is_pay_to_public_key_hash()
            || self.is_pay_to_script_hash()
            || self.is_public_key_script()
            || self.is_standard_multisig()
            || self.is_standard_op_return()
    }

    /// True when the script only pushes constants: no chunk starts with a
    /// byte above `OP_16`.
    pub fn is_data_only(&self) -> bool {
        self.chunks.iter().all(|c| c.opcode().to_u8() <= OP_16)
    }

    /// The 20-byte hash of a P2PKH script.
    pub fn public_key_hash(&self) -> Option<&[u8]> {
        if self.is_pay_to_public_key_hash() {
            self.chunks[2].pushed_data()
        } else {
            None
        }
    }
}

fn is_implicit_push_of(chunk: &ScriptChunk, len: usize) -> bool {
    matches!(chunk, ScriptChunk::Push { encoding: PushEncoding::Implicit, data } if data.len() == len)
}

fn is_p2sh_pattern(chunks: &[ScriptChunk]) -> bool {
    match chunks {
        [ScriptChunk::Opcode(Opcode::OpHash160), hash, ScriptChunk::Opcode(Opcode::OpEqual)] => {
            is_implicit_push_of(hash, 20)
        }
        _ => false,
    }
}

/// The mnemonic form, chunks separated by single spaces.
impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chunk) in self.chunks.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", chunk)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl std::str::FromStr for Script {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Script::from_asm(s)
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
