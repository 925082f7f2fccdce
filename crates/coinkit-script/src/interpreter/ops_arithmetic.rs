//! Arithmetic operations.
//!
//! Operands are decoded from at most four bytes; results are pushed in
//! their minimal encoding even when they no longer fit an operand.

use super::context::ExecutionContext;
use super::error::ScriptExecutionError;

impl<'a> ExecutionContext<'a> {
    pub(crate) fn op_unary(&mut self, f: impl FnOnce(i64) -> i64) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(1)?;
        let a = self.pop_number()?;
        self.push_number(f(i64::from(a)));
        Ok(())
    }

    /// Both operands are decoded before either is popped.
    pub(crate) fn op_binary(&mut self, f: impl FnOnce(i64, i64) -> i64) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let a = self.number(-2)?;
        let b = self.number(-1)?;
        self.stack.truncate(self.stack.len() - 2);
        self.push_number(f(i64::from(a), i64::from(b)));
        Ok(())
    }

    /// OP_DIV truncates toward zero; OP_MOD takes the dividend's sign.
    pub(crate) fn op_div_mod(&mut self, modulo: bool) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        if self.number(-1)? == 0 {
            return Err(ScriptExecutionError::msg("Division by zero error"));
        }
        if modulo {
            self.op_binary(|a, b| a % b)
        } else {
            self.op_binary(|a, b| a / b)
        }
    }

    pub(crate) fn op_numequalverify(&mut self) -> Result<(), ScriptExecutionError> {
        self.op_binary(|a, b| i64::from(a == b))?;
        self.verify_top("OP_NUMEQUALVERIFY")
    }

    /// x min max -> min <= x < max
    pub(crate) fn op_within(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(3)?;
        let x = self.number(-3)?;
        let min = self.number(-2)?;
        let max = self.number(-1)?;
        self.stack.truncate(self.stack.len() - 3);
        self.push_bool(min <= x && x < max);
        Ok(())
    }
}
