//! CHECKLOCKTIMEVERIFY and CHECKSEQUENCEVERIFY.
//!
//! Both leave their operand on the stack, so scripts follow them with
//! `OP_DROP`.

use super::context::ExecutionContext;
use super::error::ScriptExecutionError;
use super::scriptnum::ScriptNumber;

/// Lock times below this are block heights, above it unix timestamps.
const LOCK_TIME_THRESHOLD: i64 = 500_000_000;
const MAX_TX_IN_SEQUENCE_NUM: u32 = 0xffff_ffff;
const SEQUENCE_LOCK_TIME_DISABLED: i64 = 1 << 31;
const SEQUENCE_LOCK_TIME_IS_SECONDS: i64 = 1 << 22;
const SEQUENCE_LOCK_TIME_MASK: i64 = 0x0000_ffff;

/// Lock-time operands may be five bytes wide so they can reach 2^32 - 1.
const LOCK_TIME_OPERAND_LENGTH: usize = 5;

fn unsatisfied(reason: impl std::fmt::Display) -> ScriptExecutionError {
    ScriptExecutionError::msg(format!("UNSATISFIED_LOCKTIME: {}", reason))
}

/// Both values must be of the same kind (either side of `threshold`) and
/// the required one must not exceed the actual one.
fn verify_lock_time(actual: i64, threshold: i64, required: i64) -> Result<(), ScriptExecutionError> {
    if (actual < threshold) != (required < threshold) {
        return Err(unsatisfied(format!(
            "mismatched lock time types: {} vs {}",
            actual, required
        )));
    }
    if required > actual {
        return Err(unsatisfied(format!(
            "lock time {} not reached, currently {}",
            required, actual
        )));
    }
    Ok(())
}

impl<'a> ExecutionContext<'a> {
    fn lock_time_operand(&self) -> Result<i64, ScriptExecutionError> {
        self.assert_stack_height(1)?;
        let value = ScriptNumber::from_bytes(self.data(-1)?, LOCK_TIME_OPERAND_LENGTH)?.value();
        if value < 0 {
            return Err(ScriptExecutionError::msg("NEGATIVE_LOCKTIME"));
        }
        Ok(value)
    }

    pub(crate) fn op_check_locktime_verify(&mut self) -> Result<(), ScriptExecutionError> {
        let required = self.lock_time_operand()?;
        let signing = self.require_signing_context()?;

        verify_lock_time(i64::from(signing.lock_time()), LOCK_TIME_THRESHOLD, required)?;

        // A final input makes the transaction's lock time meaningless.
        if signing.input_sequence() == MAX_TX_IN_SEQUENCE_NUM {
            return Err(unsatisfied("transaction input is finalized"));
        }
        Ok(())
    }

    /// Relative lock time. An operand with the disable bit set behaves as
    /// a NOP.
    pub(crate) fn op_check_sequence_verify(&mut self) -> Result<(), ScriptExecutionError> {
        let required = self.lock_time_operand()?;
        if required & SEQUENCE_LOCK_TIME_DISABLED != 0 {
            return Ok(());
        }

        let signing = self.require_signing_context()?;
        if signing.tx_version() < 2 {
            return Err(unsatisfied(format!(
                "invalid transaction version: {}",
                signing.tx_version()
            )));
        }

        let sequence = i64::from(signing.input_sequence());
        if sequence & SEQUENCE_LOCK_TIME_DISABLED != 0 {
            return Err(unsatisfied(format!(
                "transaction sequence has the disable bit set: 0x{:x}",
                sequence
            )));
        }

        let mask = SEQUENCE_LOCK_TIME_IS_SECONDS | SEQUENCE_LOCK_TIME_MASK;
        verify_lock_time(sequence & mask, SEQUENCE_LOCK_TIME_IS_SECONDS, required & mask)
    }
}
