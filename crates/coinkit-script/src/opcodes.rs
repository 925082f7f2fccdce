//! Opcode table.
//!
//! Every byte value maps to exactly one [`Opcode`]. Named opcodes also get a
//! `u8` constant (`OP_DUP`, `OP_CHECKSIG`, ...) for building raw scripts.
//! Bytes with no assigned meaning decode to [`Opcode::OpUnknown`], so the
//! interpreter's dispatch stays an exhaustive match.

use std::fmt;

macro_rules! opcode_table {
    ($($variant:ident = $byte:literal => $konst:ident;)*) => {
        $(pub const $konst: u8 = $byte;)*

        /// A script opcode.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Opcode {
            /// Direct push of 1..=75 bytes. Carries the length.
            PushBytes(u8),
            /// `OP_1`..=`OP_16`. Carries the small integer.
            OpNum(u8),
            /// A byte with no assigned opcode.
            OpUnknown(u8),
            $($variant,)*
        }

        impl Opcode {
            /// Decode one opcode byte.
            pub fn from_u8(byte: u8) -> Self {
                match byte {
                    0x01..=0x4b => Opcode::PushBytes(byte),
                    0x51..=0x60 => Opcode::OpNum(byte - 0x50),
                    $($byte => Opcode::$variant,)*
                    other => Opcode::OpUnknown(other),
                }
            }

            /// The byte this opcode is encoded as.
            pub fn to_u8(self) -> u8 {
                match self {
                    Opcode::PushBytes(len) => len,
                    Opcode::OpNum(n) => 0x50 + n,
                    Opcode::OpUnknown(byte) => byte,
                    $(Opcode::$variant => $byte,)*
                }
            }

            /// Canonical mnemonic, e.g. `"OP_DUP"`.
            ///
            /// Direct pushes share the name `OP_PUSHBYTES` and unassigned
            /// bytes share `OP_UNKNOWN`; `Display` spells out their byte.
            pub fn name(self) -> &'static str {
                match self {
                    Opcode::PushBytes(_) => "OP_PUSHBYTES",
                    Opcode::OpNum(n) => SMALL_INT_NAMES[(n as usize).saturating_sub(1) % 16],
                    Opcode::OpUnknown(_) => "OP_UNKNOWN",
                    $(Opcode::$variant => stringify!($konst),)*
                }
            }
        }
    };
}

opcode_table! {
    Op0 = 0x00 => OP_0;
    PushData1 = 0x4c => OP_PUSHDATA1;
    PushData2 = 0x4d => OP_PUSHDATA2;
    PushData4 = 0x4e => OP_PUSHDATA4;
    Op1Negate = 0x4f => OP_1NEGATE;
    OpReserved = 0x50 => OP_RESERVED;

    OpNop = 0x61 => OP_NOP;
    OpVer = 0x62 => OP_VER;
    OpIf = 0x63 => OP_IF;
    OpNotIf = 0x64 => OP_NOTIF;
    OpVerIf = 0x65 => OP_VERIF;
    OpVerNotIf = 0x66 => OP_VERNOTIF;
    OpElse = 0x67 => OP_ELSE;
    OpEndIf = 0x68 => OP_ENDIF;
    OpVerify = 0x69 => OP_VERIFY;
    OpReturn = 0x6a => OP_RETURN;

    OpToAltStack = 0x6b => OP_TOALTSTACK;
    OpFromAltStack = 0x6c => OP_FROMALTSTACK;
    Op2Drop = 0x6d => OP_2DROP;
    Op2Dup = 0x6e => OP_2DUP;
    Op3Dup = 0x6f => OP_3DUP;
    Op2Over = 0x70 => OP_2OVER;
    Op2Rot = 0x71 => OP_2ROT;
    Op2Swap = 0x72 => OP_2SWAP;
    OpIfDup = 0x73 => OP_IFDUP;
    OpDepth = 0x74 => OP_DEPTH;
    OpDrop = 0x75 => OP_DROP;
    OpDup = 0x76 => OP_DUP;
    OpNip = 0x77 => OP_NIP;
    OpOver = 0x78 => OP_OVER;
    OpPick = 0x79 => OP_PICK;
    OpRoll = 0x7a => OP_ROLL;
    OpRot = 0x7b => OP_ROT;
    OpSwap = 0x7c => OP_SWAP;
    OpTuck = 0x7d => OP_TUCK;

    OpCat = 0x7e => OP_CAT;
    OpSplit = 0x7f => OP_SPLIT;
    OpNum2Bin = 0x80 => OP_NUM2BIN;
    OpBin2Num = 0x81 => OP_BIN2NUM;
    OpSize = 0x82 => OP_SIZE;

    OpInvert = 0x83 => OP_INVERT;
    OpAnd = 0x84 => OP_AND;
    OpOr = 0x85 => OP_OR;
    OpXor = 0x86 => OP_XOR;
    OpEqual = 0x87 => OP_EQUAL;
    OpEqualVerify = 0x88 => OP_EQUALVERIFY;
    OpReserved1 = 0x89 => OP_RESERVED1;
    OpReserved2 = 0x8a => OP_RESERVED2;

    Op1Add = 0x8b => OP_1ADD;
    Op1Sub = 0x8c => OP_1SUB;
    Op2Mul = 0x8d => OP_2MUL;
    Op2Div = 0x8e => OP_2DIV;
    OpNegate = 0x8f => OP_NEGATE;
    OpAbs = 0x90 => OP_ABS;
    OpNot = 0x91 => OP_NOT;
    Op0NotEqual = 0x92 => OP_0NOTEQUAL;
    OpAdd = 0x93 => OP_ADD;
    OpSub = 0x94 => OP_SUB;
    OpMul = 0x95 => OP_MUL;
    OpDiv = 0x96 => OP_DIV;
    OpMod = 0x97 => OP_MOD;
    OpLShift = 0x98 => OP_LSHIFT;
    OpRShift = 0x99 => OP_RSHIFT;
    OpBoolAnd = 0x9a => OP_BOOLAND;
    OpBoolOr = 0x9b => OP_BOOLOR;
    OpNumEqual = 0x9c => OP_NUMEQUAL;
    OpNumEqualVerify = 0x9d => OP_NUMEQUALVERIFY;
    OpNumNotEqual = 0x9e => OP_NUMNOTEQUAL;
    OpLessThan = 0x9f => OP_LESSTHAN;
    OpGreaterThan = 0xa0 => OP_GREATERTHAN;
    OpLessThanOrEqual = 0xa1 => OP_LESSTHANOREQUAL;
    OpGreaterThanOrEqual = 0xa2 => OP_GREATERTHANOREQUAL;
    OpMin = 0xa3 => OP_MIN;
    OpMax = 0xa4 => OP_MAX;
    OpWithin = 0xa5 => OP_WITHIN;

    OpRipemd160 = 0xa6 => OP_RIPEMD160;
    OpSha1 = 0xa7 => OP_SHA1;
    OpSha256 = 0xa8 => OP_SHA256;
    OpHash160 = 0xa9 => OP_HASH160;
    OpHash256 = 0xaa => OP_HASH256;
    OpCodeSeparator = 0xab => OP_CODESEPARATOR;
    OpCheckSig = 0xac => OP_CHECKSIG;
    OpCheckSigVerify = 0xad => OP_CHECKSIGVERIFY;
    OpCheckMultiSig = 0xae => OP_CHECKMULTISIG;
    OpCheckMultiSigVerify = 0xaf => OP_CHECKMULTISIGVERIFY;

    OpNop1 = 0xb0 => OP_NOP1;
    OpCheckLockTimeVerify = 0xb1 => OP_CHECKLOCKTIMEVERIFY;
    OpCheckSequenceVerify = 0xb2 => OP_CHECKSEQUENCEVERIFY;
    OpNop4 = 0xb3 => OP_NOP4;
    OpNop5 = 0xb4 => OP_NOP5;
    OpNop6 = 0xb5 => OP_NOP6;
    OpNop7 = 0xb6 => OP_NOP7;
    OpNop8 = 0xb7 => OP_NOP8;
    OpNop9 = 0xb8 => OP_NOP9;
    OpNop10 = 0xb9 => OP_NOP10;

    OpPubKeyHash = 0xfd => OP_PUBKEYHASH;
    OpPubKey = 0xfe => OP_PUBKEY;
    OpInvalidOpcode = 0xff => OP_INVALIDOPCODE;
}

pub const OP_FALSE: u8 = OP_0;
pub const OP_TRUE: u8 = OP_1;
pub const OP_1: u8 = 0x51;
pub const OP_2: u8 = 0x52;
pub const OP_3: u8 = 0x53;
pub const OP_4: u8 = 0x54;
pub const OP_5: u8 = 0x55;
pub const OP_6: u8 = 0x56;
pub const OP_7: u8 = 0x57;
pub const OP_8: u8 = 0x58;
pub const OP_9: u8 = 0x59;
pub const OP_10: u8 = 0x5a;
pub const OP_11: u8 = 0x5b;
pub const OP_12: u8 = 0x5c;
pub const OP_13: u8 = 0x5d;
pub const OP_14: u8 = 0x5e;
pub const OP_15: u8 = 0x5f;
pub const OP_16: u8 = 0x60;
pub const OP_NOP2: u8 = OP_CHECKLOCKTIMEVERIFY;
pub const OP_NOP3: u8 = OP_CHECKSEQUENCEVERIFY;

const SMALL_INT_NAMES: [&str; 16] = [
    "OP_1", "OP_2", "OP_3", "OP_4", "OP_5", "OP_6", "OP_7", "OP_8", "OP_9", "OP_10", "OP_11",
    "OP_12", "OP_13", "OP_14", "OP_15", "OP_16",
];

impl Opcode {
    /// Look up an opcode by mnemonic.
    ///
    /// Accepts the canonical names plus the aliases `OP_FALSE`, `OP_TRUE`,
    /// `OP_NOP2` and `OP_NOP3`. Direct pushes and unassigned bytes have no
    /// name of their own and are never returned.
    pub fn from_name(name: &str) -> Option<Self> {
        let alias = match name {
            "OP_FALSE" => Some(OP_FALSE),
            "OP_TRUE" => Some(OP_TRUE),
            "OP_NOP2" => Some(OP_NOP2),
            "OP_NOP3" => Some(OP_NOP3),
            _ => None,
        };
        if let Some(byte) = alias {
            return Some(Opcode::from_u8(byte));
        }
        (0..=u8::MAX)
            .map(Opcode::from_u8)
            .filter(|op| !matches!(op, Opcode::PushBytes(_) | Opcode::OpUnknown(_)))
            .find(|op| op.name() == name)
    }

    /// The opcode that pushes `n`, for `n` in 0..=16.
    pub fn small_integer(n: u8) -> Option<Self> {
        match n {
            0 => Some(Opcode::Op0),
            1..=16 => Some(Opcode::OpNum(n)),
            _ => None,
        }
    }

    /// The value `OP_0`..`OP_16` push; `None` for every other opcode.
    pub fn as_small_integer(self) -> Option<u8> {
        match self {
            Opcode::Op0 => Some(0),
            Opcode::OpNum(n) => Some(n),
            _ => None,
        }
    }

    /// True for the bytes that introduce a data push (`OP_0`..=`OP_PUSHDATA4`).
    pub fn is_push(self) -> bool {
        self.to_u8() <= OP_PUSHDATA4
    }

    /// True for IF, NOTIF, VERIF, VERNOTIF, ELSE and ENDIF, which run even
    /// inside an unexecuted branch.
    pub fn is_conditional(self) -> bool {
        (OP_IF..=OP_ENDIF).contains(&self.to_u8())
    }

    /// True when the opcode may never run.
    ///
    /// INVERT, 2MUL, 2DIV, MUL, LSHIFT and RSHIFT are always disabled. The
    /// opcodes re-enabled by the May 2018 upgrade are disabled only when
    /// `monolith` is false.
    pub fn is_disabled(self, monolith: bool) -> bool {
        match self {
            Opcode::OpInvert
            | Opcode::Op2Mul
            | Opcode::Op2Div
            | Opcode::OpMul
            | Opcode::OpLShift
            | Opcode::OpRShift => true,
            Opcode::OpCat
            | Opcode::OpSplit
            | Opcode::OpAnd
            | Opcode::OpOr
            | Opcode::OpXor
            | Opcode::OpDiv
            | Opcode::OpMod
            | Opcode::OpNum2Bin
            | Opcode::OpBin2Num => !monolith,
            _ => false,
        }
    }
}

impl From<u8> for Opcode {
    fn from(byte: u8) -> Self {
        Opcode::from_u8(byte)
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op.to_u8()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::PushBytes(len) => write!(f, "OP_PUSHBYTES_{}", len),
            Opcode::OpUnknown(byte) => write!(f, "OP_UNKNOWN_{:02x}", byte),
            op => f.write_str(op.name()),
        }
    }
}
