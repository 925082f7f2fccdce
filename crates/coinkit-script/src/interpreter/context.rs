//! Execution state for one verification attempt.

use std::fmt;

use super::config::Config;
use super::error::{ScriptExecutionError, ScriptVerificationError};
use super::scriptnum::{ScriptNumber, MAX_NUMBER_LENGTH};
use super::SigningContext;
use crate::Script;

/// Stacks, counters and the optional transaction binding used while
/// scripts run.
///
/// A context is created for one verification and thrown away afterwards.
/// Stack indices may be negative, counting back from the top (`-1` is the
/// top element).
pub struct ExecutionContext<'a> {
    pub(crate) stack: Vec<Vec<u8>>,
    pub(crate) alt_stack: Vec<Vec<u8>>,
    /// One flag per open IF; `true` while that branch executes.
    pub(crate) condition_stack: Vec<bool>,
    pub(crate) op_count: usize,
    block_timestamp: u32,
    config: Config,
    signing: Option<&'a dyn SigningContext>,
}

impl<'a> ExecutionContext<'a> {
    /// A context without a transaction.
    ///
    /// The block time defaults to `u32::MAX`, so every time-activated rule
    /// (P2SH) applies. Use [`with_block_timestamp`](Self::with_block_timestamp)
    /// to evaluate as of an earlier block.
    pub fn new() -> Self {
        ExecutionContext {
            stack: Vec::new(),
            alt_stack: Vec::new(),
            condition_stack: Vec::new(),
            op_count: 0,
            block_timestamp: u32::MAX,
            config: Config::default(),
            signing: None,
        }
    }

    /// A context bound to a spending transaction.
    pub fn with_signing_context(signing: &'a dyn SigningContext) -> Self {
        let mut context = ExecutionContext::new();
        context.signing = Some(signing);
        context
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Override the block time used to decide whether P2SH applies.
    pub fn with_block_timestamp(mut self, timestamp: u32) -> Self {
        self.block_timestamp = timestamp;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn stack(&self) -> &[Vec<u8>] {
        &self.stack
    }

    pub fn alt_stack(&self) -> &[Vec<u8>] {
        &self.alt_stack
    }

    pub fn condition_stack(&self) -> &[bool] {
        &self.condition_stack
    }

    pub fn op_count(&self) -> usize {
        self.op_count
    }

    pub fn block_timestamp(&self) -> u32 {
        self.block_timestamp
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn signing_context(&self) -> Option<&'a dyn SigningContext> {
        self.signing
    }

    /// True when no enclosing IF branch is being skipped.
    pub fn should_execute(&self) -> bool {
        !self.condition_stack.contains(&false)
    }

    /// True once the block time reaches the P2SH activation time.
    pub fn should_verify_p2sh(&self) -> bool {
        self.block_timestamp >= self.config.p2sh_activation_timestamp
    }

    // -----------------------------------------------------------------------
    // Push
    // -----------------------------------------------------------------------

    /// Push `0x01` for true, the empty string for false.
    pub fn push_bool(&mut self, value: bool) {
        self.stack.push(if value { vec![1] } else { Vec::new() });
    }

    /// Push the minimal encoding of `n`.
    pub fn push_number(&mut self, n: i64) {
        self.stack.push(ScriptNumber::new(n).to_bytes());
    }

    /// Push raw data.
    ///
    /// # Returns
    /// An error when `data` exceeds the maximum element size.
    pub fn push_data(&mut self, data: Vec<u8>) -> Result<(), ScriptExecutionError> {
        if data.len() > self.config.max_script_element_size {
            return Err(ScriptExecutionError::msg("PushedData size is too big."));
        }
        self.stack.push(data);
        Ok(())
    }

    pub fn push_to_alt_stack(&mut self, data: Vec<u8>) {
        self.alt_stack.push(data);
    }

    // -----------------------------------------------------------------------
    // Peek
    // -----------------------------------------------------------------------

    /// The element at `at`.
    pub fn data(&self, at: isize) -> Result<&[u8], ScriptExecutionError> {
        let i = self.index(at)?;
        Ok(&self.stack[i])
    }

    /// The element at `at` decoded as a number of at most four bytes.
    pub fn number(&self, at: isize) -> Result<i32, ScriptExecutionError> {
        let n = ScriptNumber::from_bytes(self.data(at)?, MAX_NUMBER_LENGTH)?;
        Ok(n.to_i32())
    }

    /// The element at `at` read as a boolean.
    ///
    /// Empty, all-zero and negative zero (zeros ending in `0x80`) are false.
    pub fn bool(&self, at: isize) -> Result<bool, ScriptExecutionError> {
        Ok(cast_to_bool(self.data(at)?))
    }

    // -----------------------------------------------------------------------
    // Pop
    // -----------------------------------------------------------------------

    pub fn pop_data(&mut self) -> Result<Vec<u8>, ScriptExecutionError> {
        self.stack
            .pop()
            .ok_or(ScriptExecutionError::OpcodeRequiresItemsOnStack(1))
    }

    pub fn pop_number(&mut self) -> Result<i32, ScriptExecutionError> {
        let n = self.number(-1)?;
        self.stack.pop();
        Ok(n)
    }

    pub fn pop_bool(&mut self) -> Result<bool, ScriptExecutionError> {
        let b = self.bool(-1)?;
        self.stack.pop();
        Ok(b)
    }

    pub fn pop_from_alt_stack(&mut self) -> Result<Vec<u8>, ScriptExecutionError> {
        self.assert_alt_stack_height(1)?;
        self.alt_stack
            .pop()
            .ok_or(ScriptExecutionError::OpcodeRequiresItemsOnStack(1))
    }

    // -----------------------------------------------------------------------
    // Stack management
    // -----------------------------------------------------------------------

    /// Clear the main, alt and condition stacks.
    pub fn reset_stack(&mut self) {
        self.stack.clear();
        self.alt_stack.clear();
        self.condition_stack.clear();
    }

    pub fn swap_data_at(&mut self, i: isize, j: isize) -> Result<(), ScriptExecutionError> {
        let (i, j) = (self.index(i)?, self.index(j)?);
        self.stack.swap(i, j);
        Ok(())
    }

    pub fn assert_stack_height(&self, n: usize) -> Result<(), ScriptExecutionError> {
        if self.stack.len() < n {
            return Err(ScriptExecutionError::OpcodeRequiresItemsOnStack(n));
        }
        Ok(())
    }

    pub fn assert_alt_stack_height(&self, n: usize) -> Result<(), ScriptExecutionError> {
        if self.alt_stack.len() < n {
            return Err(ScriptExecutionError::msg(format!(
                "Operation requires {} items on altstack.",
                n
            )));
        }
        Ok(())
    }

    /// Count `n` more operations against the per-script ceiling.
    pub fn increment_op_count(&mut self, n: usize) -> Result<(), ScriptExecutionError> {
        self.op_count += n;
        if self.op_count > self.config.max_ops_per_script {
            return Err(ScriptExecutionError::msg(
                "Exceeded the allowed number of operations per script.",
            ));
        }
        Ok(())
    }

    /// Take the redeem script off a saved P2SH stack.
    ///
    /// The last element of `stack_for_p2sh` is parsed as the script. The
    /// context's stacks are reset and the remaining elements become the new
    /// main stack.
    pub fn deserialize_p2sh_lock_script(
        &mut self,
        mut stack_for_p2sh: Vec<Vec<u8>>,
    ) -> Result<Script, ScriptVerificationError> {
        let serialized = stack_for_p2sh.pop().ok_or(ScriptVerificationError::EmptyStack)?;
        let redeem = Script::parse(&serialized).map_err(ScriptVerificationError::P2shDeserialize)?;
        self.reset_stack();
        self.stack = stack_for_p2sh;
        Ok(redeem)
    }

    fn index(&self, at: isize) -> Result<usize, ScriptExecutionError> {
        let len = self.stack.len() as isize;
        let i = if at < 0 { len + at } else { at };
        if (0..len).contains(&i) {
            Ok(i as usize)
        } else {
            let needed = if at < 0 { at.unsigned_abs() } else { at as usize + 1 };
            Err(ScriptExecutionError::OpcodeRequiresItemsOnStack(needed))
        }
    }
}

impl Default for ExecutionContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Script truthiness of a stack element.
pub fn cast_to_bool(data: &[u8]) -> bool {
    match data.iter().rposition(|&b| b != 0) {
        None => false,
        Some(i) => !(i == data.len() - 1 && data[i] == 0x80 && data[..i].iter().all(|&b| b == 0)),
    }
}

fn describe(data: &[u8]) -> String {
    let hex = hex::encode(data);
    match hex.as_str() {
        "" => "NULL [FALSE/0]".to_string(),
        "01" => "0x01 [TRUE/1]".to_string(),
        _ if hex.len() > 20 => {
            format!("{}..{} [{}bytes]", &hex[..5], &hex[hex.len() - 5..], data.len())
        }
        _ => format!("0x{}", hex),
    }
}

/// The stacks as a table, top element first.
impl fmt::Display for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for data in self.stack.iter().rev() {
            writeln!(f, "| {:^26} |", describe(data))?;
        }
        writeln!(f, "{}", "=".repeat(30))?;
        if !self.alt_stack.is_empty() {
            writeln!(f, "altstack:")?;
            for data in self.alt_stack.iter().rev() {
                writeln!(f, "| {:^26} |", describe(data))?;
            }
            writeln!(f, "{}", "=".repeat(30))?;
        }
        Ok(())
    }
}

impl fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("stack", &self.stack)
            .field("alt_stack", &self.alt_stack)
            .field("condition_stack", &self.condition_stack)
            .field("op_count", &self.op_count)
            .field("block_timestamp", &self.block_timestamp)
            .field("signing", &self.signing.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(items: &[&[u8]]) -> ExecutionContext<'static> {
        let mut ctx = ExecutionContext::new();
        for item in items {
            ctx.push_data(item.to_vec()).unwrap();
        }
        ctx
    }

    // ---- Booleans ----

    /// Negative zero and all-zero strings are false.
    #[test]
    fn test_cast_to_bool() {
        assert!(!cast_to_bool(&[]));
        assert!(!cast_to_bool(&[0x00]));
        assert!(!cast_to_bool(&[0x00, 0x00]));
        assert!(!cast_to_bool(&[0x80]));
        assert!(!cast_to_bool(&[0x00, 0x80]));
        assert!(cast_to_bool(&[0x01]));
        assert!(cast_to_bool(&[0x80, 0x00]));
        assert!(cast_to_bool(&[0x00, 0x81]));
        assert!(cast_to_bool(&[0x01, 0x80]));
    }

    #[test]
    fn test_push_bool() {
        let mut ctx = ExecutionContext::new();
        ctx.push_bool(true);
        ctx.push_bool(false);
        assert_eq!(ctx.stack(), &[vec![1u8], vec![]]);
        assert!(!ctx.bool(-1).unwrap());
        assert!(ctx.bool(0).unwrap());
    }

    // ---- Numbers ----

    #[test]
    fn test_number_roundtrip() {
        let mut ctx = ExecutionContext::new();
        ctx.push_number(-1);
        ctx.push_number(1000);
        assert_eq!(ctx.number(-2).unwrap(), -1);
        assert_eq!(ctx.pop_number().unwrap(), 1000);
        assert_eq!(ctx.stack(), &[vec![0x81u8]]);
    }

    /// Five-byte operands are rejected.
    #[test]
    fn test_number_too_wide() {
        let ctx = context_with(&[&[0, 0, 0, 0x80, 0]]);
        assert_eq!(ctx.number(-1), Err(ScriptExecutionError::InvalidBignum));
    }

    // ---- Limits ----

    #[test]
    fn test_push_data_size_limit() {
        let mut ctx = ExecutionContext::new();
        assert!(ctx.push_data(vec![0; 520]).is_ok());
        assert_eq!(
            ctx.push_data(vec![0; 521]),
            Err(ScriptExecutionError::msg("PushedData size is too big."))
        );
    }

    #[test]
    fn test_op_count_limit() {
        let mut ctx = ExecutionContext::new();
        assert!(ctx.increment_op_count(201).is_ok());
        assert!(ctx.increment_op_count(1).is_err());
    }

    #[test]
    fn test_stack_height_assertions() {
        let ctx = context_with(&[b"a"]);
        assert!(ctx.assert_stack_height(1).is_ok());
        assert_eq!(
            ctx.assert_stack_height(2),
            Err(ScriptExecutionError::OpcodeRequiresItemsOnStack(2))
        );
        assert_eq!(
            ctx.assert_alt_stack_height(1),
            Err(ScriptExecutionError::msg("Operation requires 1 items on altstack."))
        );
    }

    // ---- Indexing ----

    #[test]
    fn test_negative_indices() {
        let mut ctx = context_with(&[b"a", b"b", b"c"]);
        assert_eq!(ctx.data(-1).unwrap(), b"c");
        assert_eq!(ctx.data(0).unwrap(), b"a");
        assert_eq!(
            ctx.data(-4),
            Err(ScriptExecutionError::OpcodeRequiresItemsOnStack(4))
        );
        ctx.swap_data_at(-3, -1).unwrap();
        assert_eq!(ctx.data(0).unwrap(), b"c");
    }

    // ---- P2SH ----

    #[test]
    fn test_deserialize_p2sh_lock_script() {
        let mut ctx = context_with(&[b"x"]);
        ctx.push_to_alt_stack(vec![1]);
        let saved = vec![vec![0xaa], vec![0x76, 0xa9]];
        let redeem = ctx.deserialize_p2sh_lock_script(saved).unwrap();
        assert_eq!(redeem.to_hex(), "76a9");
        assert_eq!(ctx.stack(), &[vec![0xaau8]]);
        assert!(ctx.alt_stack().is_empty());
    }

    #[test]
    fn test_deserialize_p2sh_bad_script() {
        let mut ctx = ExecutionContext::new();
        assert!(matches!(
            ctx.deserialize_p2sh_lock_script(vec![vec![0x05, 0x01]]),
            Err(ScriptVerificationError::P2shDeserialize(_))
        ));
        assert_eq!(
            ctx.deserialize_p2sh_lock_script(vec![]).unwrap_err(),
            ScriptVerificationError::EmptyStack
        );
    }

    #[test]
    fn test_should_verify_p2sh() {
        let ctx = ExecutionContext::new().with_block_timestamp(1_333_238_399);
        assert!(!ctx.should_verify_p2sh());
        let ctx = ctx.with_block_timestamp(1_333_238_400);
        assert!(ctx.should_verify_p2sh());
    }

    /// Without an explicit block time P2SH always applies.
    #[test]
    fn test_default_block_timestamp_is_fixed() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.block_timestamp(), u32::MAX);
        assert!(ctx.should_verify_p2sh());
    }

    #[test]
    fn test_display_table() {
        let mut ctx = context_with(&[&[], &[1], &[0xab; 16]]);
        ctx.push_to_alt_stack(vec![2]);
        let table = ctx.to_string();
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].contains("ababa..babab [16bytes]"));
        assert!(lines[1].contains("0x01 [TRUE/1]"));
        assert!(lines[2].contains("NULL [FALSE/0]"));
        assert_eq!(lines[3], "=".repeat(30));
        assert_eq!(lines[4], "altstack:");
        assert!(lines[5].contains("0x02"));
    }
}
