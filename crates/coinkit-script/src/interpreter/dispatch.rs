//! Per-chunk execution and opcode dispatch.

use tracing::trace;

use super::context::ExecutionContext;
use super::error::ScriptExecutionError;
use super::ops_crypto::HashKind;
use crate::chunk::ScriptChunk;
use crate::opcodes::{Opcode, OP_16};

impl<'a> ExecutionContext<'a> {
    /// Execute one chunk.
    ///
    /// Pushes happen only inside an executing branch. For opcodes, anything
    /// above `OP_16` is counted toward the operation ceiling and disabled
    /// opcodes fail before the branch state is consulted; the flow-control
    /// opcodes then run regardless of branch state so IF/ENDIF stay paired.
    pub fn execute_chunk(&mut self, chunk: &ScriptChunk) -> Result<(), ScriptExecutionError> {
        match chunk {
            ScriptChunk::Push { data, .. } => {
                if self.should_execute() {
                    self.push_data(data.clone())?;
                }
            }
            ScriptChunk::Opcode(op) => {
                let op = *op;
                if op.to_u8() > OP_16 {
                    self.increment_op_count(1)?;
                }
                if op.is_disabled(self.config().monolith_opcodes) {
                    return Err(ScriptExecutionError::DisabledOpcode(op.name()));
                }
                if !self.should_execute() && !op.is_conditional() {
                    return Ok(());
                }
                self.dispatch(op)?;
            }
        }
        trace!(chunk = %chunk, depth = self.stack.len(), "executed");
        Ok(())
    }

    fn dispatch(&mut self, op: Opcode) -> Result<(), ScriptExecutionError> {
        match op {
            // Constants. Pushes normally arrive as `ScriptChunk::Push`.
            Opcode::Op0 => {
                self.push_bool(false);
                Ok(())
            }
            Opcode::Op1Negate => {
                self.push_number(-1);
                Ok(())
            }
            Opcode::OpNum(n) => {
                self.push_number(i64::from(n));
                Ok(())
            }
            Opcode::PushBytes(_) | Opcode::PushData1 | Opcode::PushData2 | Opcode::PushData4 => {
                Err(ScriptExecutionError::msg(format!("{} without push data.", op)))
            }

            // Flow control
            Opcode::OpNop
            | Opcode::OpNop1
            | Opcode::OpNop4
            | Opcode::OpNop5
            | Opcode::OpNop6
            | Opcode::OpNop7
            | Opcode::OpNop8
            | Opcode::OpNop9
            | Opcode::OpNop10 => Ok(()),
            Opcode::OpIf => self.op_if(false),
            Opcode::OpNotIf => self.op_if(true),
            Opcode::OpElse => self.op_else(),
            Opcode::OpEndIf => self.op_endif(),
            Opcode::OpVerify => self.op_verify(),
            Opcode::OpReturn => self.op_return(),

            // Locktime
            Opcode::OpCheckLockTimeVerify => self.op_check_locktime_verify(),
            Opcode::OpCheckSequenceVerify => self.op_check_sequence_verify(),

            // Stack
            Opcode::OpToAltStack => self.op_to_alt_stack(),
            Opcode::OpFromAltStack => self.op_from_alt_stack(),
            Opcode::Op2Drop => self.op_drop_n(2),
            Opcode::Op2Dup => self.op_dup_n(2),
            Opcode::Op3Dup => self.op_dup_n(3),
            Opcode::Op2Over => self.op_2over(),
            Opcode::Op2Rot => self.op_2rot(),
            Opcode::Op2Swap => self.op_2swap(),
            Opcode::OpIfDup => self.op_ifdup(),
            Opcode::OpDepth => self.op_depth(),
            Opcode::OpDrop => self.op_drop_n(1),
            Opcode::OpDup => self.op_dup_n(1),
            Opcode::OpNip => self.op_nip(),
            Opcode::OpOver => self.op_over(),
            Opcode::OpPick => self.op_pick_or_roll(false),
            Opcode::OpRoll => self.op_pick_or_roll(true),
            Opcode::OpRot => self.op_rot(),
            Opcode::OpSwap => self.op_swap(),
            Opcode::OpTuck => self.op_tuck(),

            // Splice
            Opcode::OpCat => self.op_cat(),
            Opcode::OpSplit => self.op_split(),
            Opcode::OpNum2Bin => self.op_num2bin(),
            Opcode::OpBin2Num => self.op_bin2num(),
            Opcode::OpSize => self.op_size(),

            // Bitwise logic
            Opcode::OpAnd => self.op_bitwise(|a, b| a & b),
            Opcode::OpOr => self.op_bitwise(|a, b| a | b),
            Opcode::OpXor => self.op_bitwise(|a, b| a ^ b),
            Opcode::OpEqual => self.op_equal(),
            Opcode::OpEqualVerify => self.op_equalverify(),

            // Arithmetic
            Opcode::Op1Add => self.op_unary(|a| a + 1),
            Opcode::Op1Sub => self.op_unary(|a| a - 1),
            Opcode::OpNegate => self.op_unary(|a| -a),
            Opcode::OpAbs => self.op_unary(i64::abs),
            Opcode::OpNot => self.op_unary(|a| i64::from(a == 0)),
            Opcode::Op0NotEqual => self.op_unary(|a| i64::from(a != 0)),
            Opcode::OpAdd => self.op_binary(|a, b| a + b),
            Opcode::OpSub => self.op_binary(|a, b| a - b),
            Opcode::OpDiv => self.op_div_mod(false),
            Opcode::OpMod => self.op_div_mod(true),
            Opcode::OpBoolAnd => self.op_binary(|a, b| i64::from(a != 0 && b != 0)),
            Opcode::OpBoolOr => self.op_binary(|a, b| i64::from(a != 0 || b != 0)),
            Opcode::OpNumEqual => self.op_binary(|a, b| i64::from(a == b)),
            Opcode::OpNumEqualVerify => self.op_numequalverify(),
            Opcode::OpNumNotEqual => self.op_binary(|a, b| i64::from(a != b)),
            Opcode::OpLessThan => self.op_binary(|a, b| i64::from(a < b)),
            Opcode::OpGreaterThan => self.op_binary(|a, b| i64::from(a > b)),
            Opcode::OpLessThanOrEqual => self.op_binary(|a, b| i64::from(a <= b)),
            Opcode::OpGreaterThanOrEqual => self.op_binary(|a, b| i64::from(a >= b)),
            Opcode::OpMin => self.op_binary(i64::min),
            Opcode::OpMax => self.op_binary(i64::max),
            Opcode::OpWithin => self.op_within(),

            // Crypto
            Opcode::OpRipemd160 => self.op_hash(HashKind::Ripemd160),
            Opcode::OpSha1 => self.op_hash(HashKind::Sha1),
            Opcode::OpSha256 => self.op_hash(HashKind::Sha256),
            Opcode::OpHash160 => self.op_hash(HashKind::Hash160),
            Opcode::OpHash256 => self.op_hash(HashKind::Hash256),
            Opcode::OpCodeSeparator => Ok(()),
            Opcode::OpCheckSig => self.op_checksig(),
            Opcode::OpCheckSigVerify => self.op_checksigverify(),
            Opcode::OpCheckMultiSig => self.op_checkmultisig(),
            Opcode::OpCheckMultiSigVerify => self.op_checkmultisigverify(),

            // Always disabled; rejected before dispatch.
            Opcode::OpInvert
            | Opcode::Op2Mul
            | Opcode::Op2Div
            | Opcode::OpMul
            | Opcode::OpLShift
            | Opcode::OpRShift => Err(ScriptExecutionError::DisabledOpcode(op.name())),

            Opcode::OpReserved
            | Opcode::OpVer
            | Opcode::OpVerIf
            | Opcode::OpVerNotIf
            | Opcode::OpReserved1
            | Opcode::OpReserved2
            | Opcode::OpPubKeyHash
            | Opcode::OpPubKey
            | Opcode::OpInvalidOpcode
            | Opcode::OpUnknown(_) => Err(ScriptExecutionError::msg(format!(
                "{} should not be executed.",
                op
            ))),
        }
    }
}
