//! Stack shuffling operations.

use super::context::ExecutionContext;
use super::error::ScriptExecutionError;

impl<'a> ExecutionContext<'a> {
    pub(crate) fn op_to_alt_stack(&mut self) -> Result<(), ScriptExecutionError> {
        let top = self.pop_data()?;
        self.push_to_alt_stack(top);
        Ok(())
    }

    pub(crate) fn op_from_alt_stack(&mut self) -> Result<(), ScriptExecutionError> {
        let top = self.pop_from_alt_stack()?;
        self.stack.push(top);
        Ok(())
    }

    /// OP_DROP / OP_2DROP.
    pub(crate) fn op_drop_n(&mut self, n: usize) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(n)?;
        let len = self.stack.len();
        self.stack.truncate(len - n);
        Ok(())
    }

    /// OP_DUP / OP_2DUP / OP_3DUP: copy the top `n` items.
    pub(crate) fn op_dup_n(&mut self, n: usize) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(n)?;
        let len = self.stack.len();
        self.stack.extend_from_within(len - n..);
        Ok(())
    }

    /// x1 x2 x3 x4 -> x1 x2 x3 x4 x1 x2
    pub(crate) fn op_2over(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(4)?;
        let len = self.stack.len();
        self.stack.extend_from_within(len - 4..len - 2);
        Ok(())
    }

    /// x1 x2 x3 x4 x5 x6 -> x3 x4 x5 x6 x1 x2
    pub(crate) fn op_2rot(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(6)?;
        let len = self.stack.len();
        self.stack[len - 6..].rotate_left(2);
        Ok(())
    }

    /// x1 x2 x3 x4 -> x3 x4 x1 x2
    pub(crate) fn op_2swap(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(4)?;
        let len = self.stack.len();
        self.stack[len - 4..].rotate_left(2);
        Ok(())
    }

    pub(crate) fn op_ifdup(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(1)?;
        if self.bool(-1)? {
            self.op_dup_n(1)?;
        }
        Ok(())
    }

    pub(crate) fn op_depth(&mut self) -> Result<(), ScriptExecutionError> {
        self.push_number(self.stack.len() as i64);
        Ok(())
    }

    pub(crate) fn op_nip(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let len = self.stack.len();
        self.stack.remove(len - 2);
        Ok(())
    }

    pub(crate) fn op_over(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let second = self.data(-2)?.to_vec();
        self.stack.push(second);
        Ok(())
    }

    /// OP_PICK copies, OP_ROLL moves, the item `n` below the top.
    pub(crate) fn op_pick_or_roll(&mut self, roll: bool) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let name = if roll { "OP_ROLL" } else { "OP_PICK" };
        let n = self.pop_number()?;
        if n < 0 {
            return Err(ScriptExecutionError::msg(format!(
                "{}: n should be greater than or equal to 0.",
                name
            )));
        }
        let depth = n as usize + 1;
        self.assert_stack_height(depth)?;
        let at = self.stack.len() - depth;
        let item = if roll {
            self.stack.remove(at)
        } else {
            self.stack[at].clone()
        };
        self.stack.push(item);
        Ok(())
    }

    /// x1 x2 x3 -> x2 x3 x1
    pub(crate) fn op_rot(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(3)?;
        self.swap_data_at(-3, -2)?;
        self.swap_data_at(-2, -1)
    }

    pub(crate) fn op_swap(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        self.swap_data_at(-2, -1)
    }

    /// x1 x2 -> x2 x1 x2
    pub(crate) fn op_tuck(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let top = self.data(-1)?.to_vec();
        let len = self.stack.len();
        self.stack.insert(len - 2, top);
        Ok(())
    }
}
