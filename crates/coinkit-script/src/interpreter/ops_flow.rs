//! Flow control operations.

use super::context::ExecutionContext;
use super::error::ScriptExecutionError;

impl<'a> ExecutionContext<'a> {
    /// OP_IF / OP_NOTIF.
    ///
    /// Inside a skipped branch nothing is popped and a `false` flag is
    /// pushed so the matching ENDIF still balances.
    pub(crate) fn op_if(&mut self, negate: bool) -> Result<(), ScriptExecutionError> {
        let mut value = false;
        if self.should_execute() {
            self.assert_stack_height(1)?;
            value = self.pop_bool()? != negate;
        }
        self.condition_stack.push(value);
        Ok(())
    }

    pub(crate) fn op_else(&mut self) -> Result<(), ScriptExecutionError> {
        let top = self.condition_stack.last_mut().ok_or_else(|| {
            ScriptExecutionError::msg("Expected an OP_IF or OP_NOTIF branch before OP_ELSE.")
        })?;
        *top = !*top;
        Ok(())
    }

    pub(crate) fn op_endif(&mut self) -> Result<(), ScriptExecutionError> {
        self.condition_stack.pop().ok_or_else(|| {
            ScriptExecutionError::msg("Expected an OP_IF or OP_NOTIF branch before OP_ENDIF.")
        })?;
        Ok(())
    }

    /// Fails on a false top element; pops it only on success.
    pub(crate) fn op_verify(&mut self) -> Result<(), ScriptExecutionError> {
        self.verify_top("OP_VERIFY")
    }

    pub(crate) fn op_return(&mut self) -> Result<(), ScriptExecutionError> {
        Err(ScriptExecutionError::msg("OP_RETURN was encountered"))
    }

    /// Shared tail of the *VERIFY opcodes: peek, fail if false, pop if true.
    pub(crate) fn verify_top(&mut self, name: &str) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(1)?;
        if !self.bool(-1)? {
            return Err(ScriptExecutionError::msg(format!("{} failed.", name)));
        }
        self.stack.pop();
        Ok(())
    }
}
