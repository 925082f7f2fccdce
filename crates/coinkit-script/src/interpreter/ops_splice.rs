//! Splice and bitwise operations.

use super::context::ExecutionContext;
use super::error::ScriptExecutionError;
use super::scriptnum::{minimally_encode, MAX_NUMBER_LENGTH};

impl<'a> ExecutionContext<'a> {
    /// x1 x2 -> x1‖x2
    pub(crate) fn op_cat(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let joined = self.data(-2)?.len() + self.data(-1)?.len();
        if joined > self.config().max_script_element_size {
            return Err(ScriptExecutionError::msg("Push value size limit exceeded"));
        }
        let tail = self.pop_data()?;
        let mut head = self.pop_data()?;
        head.extend_from_slice(&tail);
        self.stack.push(head);
        Ok(())
    }

    /// x n -> x[..n] x[n..]
    pub(crate) fn op_split(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let position = self.number(-1)?;
        let data = self.data(-2)?;
        let position = usize::try_from(position)
            .ok()
            .filter(|&p| p <= data.len())
            .ok_or_else(|| ScriptExecutionError::msg("Invalid OP_SPLIT range"))?;
        let (n1, n2) = data.split_at(position);
        let (n1, n2) = (n1.to_vec(), n2.to_vec());
        let len = self.stack.len();
        self.stack[len - 2] = n1;
        self.stack[len - 1] = n2;
        Ok(())
    }

    /// x size -> x padded to `size` bytes, sign bit moved to the new end.
    pub(crate) fn op_num2bin(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let size = self.number(-1)?;
        let size = usize::try_from(size)
            .ok()
            .filter(|&s| s <= self.config().max_script_element_size)
            .ok_or_else(|| ScriptExecutionError::msg("Push value size limit exceeded"))?;

        let mut raw = minimally_encode(self.data(-2)?);
        if raw.len() > size {
            return Err(ScriptExecutionError::msg("The requested encoding is impossible to satisfy."));
        }
        let sign = match raw.last_mut() {
            Some(last) => {
                let sign = *last & 0x80;
                *last &= 0x7f;
                sign
            }
            None => 0,
        };
        raw.resize(size, 0);
        if let Some(last) = raw.last_mut() {
            *last |= sign;
        }

        self.stack.pop();
        self.stack.pop();
        self.stack.push(raw);
        Ok(())
    }

    /// Reduce a byte string to its minimal number encoding.
    pub(crate) fn op_bin2num(&mut self) -> Result<(), ScriptExecutionError> {
        let data = minimally_encode(&self.pop_data()?);
        if data.len() > MAX_NUMBER_LENGTH {
            return Err(ScriptExecutionError::msg(
                "Given operand is not a number within the valid range [-2^31...2^31]",
            ));
        }
        self.stack.push(data);
        Ok(())
    }

    /// Push the length of the top item, leaving the item in place.
    pub(crate) fn op_size(&mut self) -> Result<(), ScriptExecutionError> {
        let len = self.data(-1)?.len();
        self.push_number(len as i64);
        Ok(())
    }

    /// OP_AND / OP_OR / OP_XOR over two equal-length operands.
    pub(crate) fn op_bitwise(&mut self, f: fn(u8, u8) -> u8) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let x2 = self.pop_data()?;
        let x1 = self.pop_data()?;
        if x1.len() != x2.len() {
            return Err(ScriptExecutionError::msg("Invalid operand size"));
        }
        self.stack
            .push(x1.iter().zip(&x2).map(|(&a, &b)| f(a, b)).collect());
        Ok(())
    }

    pub(crate) fn op_equal(&mut self) -> Result<(), ScriptExecutionError> {
        self.assert_stack_height(2)?;
        let x2 = self.pop_data()?;
        let x1 = self.pop_data()?;
        self.push_bool(x1 == x2);
        Ok(())
    }

    /// OP_EQUAL then OP_VERIFY. On mismatch the pushed `false` stays on
    /// the stack.
    pub(crate) fn op_equalverify(&mut self) -> Result<(), ScriptExecutionError> {
        self.op_equal()?;
        self.verify_top("OP_EQUALVERIFY")
    }
}
