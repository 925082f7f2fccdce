//! Script verification driver.

use tracing::debug;

use super::context::{cast_to_bool, ExecutionContext};
use super::error::{ScriptExecutionError, ScriptVerificationError};
use crate::Script;

/// Runs scripts against an [`ExecutionContext`].
///
/// Stateless; all state lives in the context.
pub struct ScriptMachine;

impl ScriptMachine {
    /// Execute every chunk of `script` on `context`.
    ///
    /// The operation counter and the alt stack start fresh for each script;
    /// the main stack carries over so an unlocking script can feed the
    /// locking script.
    pub fn run(script: &Script, context: &mut ExecutionContext<'_>) -> Result<(), ScriptVerificationError> {
        if script.len() > context.config().max_script_size {
            return Err(ScriptExecutionError::ScriptTooLarge(script.len()).into());
        }
        context.op_count = 0;
        context.alt_stack.clear();

        for chunk in script.chunks() {
            context.execute_chunk(chunk)?;
        }

        if !context.condition_stack.is_empty() {
            return Err(ScriptExecutionError::msg("Condition branches not balanced.").into());
        }
        Ok(())
    }

    /// Decide whether `unlock` satisfies `lock`.
    ///
    /// Runs the unlocking script, then the locking script on the resulting
    /// stack, and requires a true top element. When P2SH applies (the
    /// locking script is `OP_HASH160 <20 bytes> OP_EQUAL` and the context's
    /// block time is past activation) the unlocking script must be push-only,
    /// its last push is run as the redeem script on the remaining pushes,
    /// and that must also end with a true top element.
    ///
    /// # Returns
    /// `Ok(true)` when the spend is authorized. Every failure is an `Err`
    /// naming the reason.
    pub fn verify(
        lock: &Script,
        unlock: &Script,
        context: &mut ExecutionContext<'_>,
    ) -> Result<bool, ScriptVerificationError> {
        Self::verify_scripts(lock, unlock, context).map_err(|err| {
            debug!(error = %err, "script verification failed");
            err
        })
    }

    fn verify_scripts(
        lock: &Script,
        unlock: &Script,
        context: &mut ExecutionContext<'_>,
    ) -> Result<bool, ScriptVerificationError> {
        debug!(script = %unlock, "running unlocking script");
        Self::run(unlock, context)?;
        let stack_for_p2sh = context.stack().to_vec();

        debug!(script = %lock, "running locking script");
        Self::run(lock, context)?;
        Self::check_top(context)?;

        if context.should_verify_p2sh() && lock.is_pay_to_script_hash() {
            if !unlock.is_data_only() {
                return Err(ScriptVerificationError::P2shNotDataOnly);
            }
            let redeem = context.deserialize_p2sh_lock_script(stack_for_p2sh)?;
            debug!(script = %redeem, "running P2SH redeem script");
            Self::run(&redeem, context)?;
            Self::check_top(context)?;
        }

        Ok(true)
    }

    fn check_top(context: &ExecutionContext<'_>) -> Result<(), ScriptVerificationError> {
        match context.stack().last() {
            None => Err(ScriptVerificationError::EmptyStack),
            Some(top) if !cast_to_bool(top) => Err(ScriptVerificationError::LastItemFalse),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::test_support::FixedSigner;
    use crate::interpreter::{Config, ScriptExecutionError};
    use coinkit_primitives::hash::hash160;

    fn asm(s: &str) -> Script {
        Script::from_asm(s).expect("valid asm")
    }

    fn verify(lock: &Script, unlock: &Script) -> Result<bool, ScriptVerificationError> {
        ScriptMachine::verify(lock, unlock, &mut ExecutionContext::new())
    }

    // ---- Plain scripts ----

    #[test]
    fn test_verify_simple() {
        assert_eq!(verify(&asm("OP_3 OP_ADD OP_5 OP_EQUAL"), &asm("OP_2")), Ok(true));
    }

    #[test]
    fn test_verify_empty_stack() {
        assert_eq!(
            verify(&asm("OP_DROP"), &asm("OP_1")),
            Err(ScriptVerificationError::EmptyStack)
        );
    }

    #[test]
    fn test_verify_last_item_false() {
        assert_eq!(
            verify(&asm("OP_NOP"), &asm("OP_0")),
            Err(ScriptVerificationError::LastItemFalse)
        );
    }

    #[test]
    fn test_verify_execution_error() {
        assert_eq!(
            verify(&asm("OP_EQUALVERIFY OP_1"), &asm("OP_1 OP_2")),
            Err(ScriptVerificationError::Execution(ScriptExecutionError::msg(
                "OP_EQUALVERIFY failed."
            )))
        );
    }

    #[test]
    fn test_run_unbalanced_conditional() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(
            ScriptMachine::run(&asm("OP_1 OP_IF"), &mut ctx),
            Err(ScriptVerificationError::Execution(ScriptExecutionError::msg(
                "Condition branches not balanced."
            )))
        );
    }

    #[test]
    fn test_run_script_too_large() {
        let config = Config {
            max_script_size: 2,
            ..Config::default()
        };
        let mut ctx = ExecutionContext::new().with_config(config);
        assert_eq!(
            ScriptMachine::run(&asm("OP_1 OP_1 OP_ADD"), &mut ctx),
            Err(ScriptVerificationError::Execution(
                ScriptExecutionError::ScriptTooLarge(3)
            ))
        );
    }

    /// Each script gets its own operation budget.
    #[test]
    fn test_op_count_is_per_script() {
        let nops = vec!["OP_NOP"; 150].join(" ");
        let unlock = asm(&format!("{} OP_1", nops));
        let lock = asm(&nops);
        assert_eq!(verify(&lock, &unlock), Ok(true));

        let too_many = asm(&vec!["OP_NOP"; 202].join(" "));
        assert!(verify(&too_many, &asm("OP_1")).is_err());
    }

    /// The alt stack does not carry over from the unlocking script.
    #[test]
    fn test_alt_stack_is_per_script() {
        assert!(verify(&asm("OP_FROMALTSTACK"), &asm("OP_1 OP_TOALTSTACK")).is_err());
    }

    // ---- Signatures ----

    #[test]
    fn test_verify_pay_to_public_key_hash() {
        let key = vec![0x02; 33];
        let sig = vec![0x30, 0x01, 0x41];
        let signer = FixedSigner::new(vec![(sig.clone(), key.clone())]);
        let lock = Script::build_public_key_hash_out(&hash160(&key));

        let mut unlock = Script::new();
        unlock.append_data(&sig).unwrap().append_data(&key).unwrap();
        let mut ctx = ExecutionContext::with_signing_context(&signer);
        assert_eq!(ScriptMachine::verify(&lock, &unlock, &mut ctx), Ok(true));

        let mut wrong = Script::new();
        wrong.append_data(&[0x30, 0x02, 0x41]).unwrap().append_data(&key).unwrap();
        let mut ctx = ExecutionContext::with_signing_context(&signer);
        assert_eq!(
            ScriptMachine::verify(&lock, &wrong, &mut ctx),
            Err(ScriptVerificationError::LastItemFalse)
        );
    }

    // ---- P2SH ----

    fn p2sh_unlock(prefix: &str, redeem: &Script) -> Script {
        let mut unlock = asm(prefix);
        unlock.append_data(redeem.bytes()).unwrap();
        unlock
    }

    #[test]
    fn test_verify_p2sh() {
        let redeem = asm("OP_3 OP_ADD OP_5 OP_EQUAL");
        let lock = redeem.to_p2sh();
        assert!(lock.is_pay_to_script_hash());
        assert_eq!(verify(&lock, &p2sh_unlock("OP_2", &redeem)), Ok(true));
        assert_eq!(
            verify(&lock, &p2sh_unlock("OP_1", &redeem)),
            Err(ScriptVerificationError::LastItemFalse)
        );
    }

    #[test]
    fn test_verify_p2sh_requires_data_only_unlock() {
        let redeem = asm("OP_3 OP_ADD OP_5 OP_EQUAL");
        let lock = redeem.to_p2sh();
        assert_eq!(
            verify(&lock, &p2sh_unlock("OP_2 OP_DUP OP_DROP", &redeem)),
            Err(ScriptVerificationError::P2shNotDataOnly)
        );
    }

    /// Before activation only the hash is checked.
    #[test]
    fn test_verify_p2sh_before_activation() {
        let redeem = asm("OP_0");
        let lock = redeem.to_p2sh();
        let unlock = p2sh_unlock("", &redeem);

        let mut ctx = ExecutionContext::new().with_block_timestamp(1_000_000_000);
        assert_eq!(ScriptMachine::verify(&lock, &unlock, &mut ctx), Ok(true));

        let mut ctx = ExecutionContext::new();
        assert_eq!(
            ScriptMachine::verify(&lock, &unlock, &mut ctx),
            Err(ScriptVerificationError::LastItemFalse)
        );
    }

    #[test]
    fn test_verify_p2sh_wrong_script() {
        let redeem = asm("OP_1");
        let lock = redeem.to_p2sh();
        let other = asm("OP_2");
        assert_eq!(
            verify(&lock, &p2sh_unlock("", &other)),
            Err(ScriptVerificationError::LastItemFalse)
        );
    }

    #[test]
    fn test_verify_p2sh_unparseable_redeem() {
        let bogus = vec![0x05, 0x01];
        let lock = {
            let mut s = Script::new();
            s.append(crate::Opcode::OpHash160)
                .unwrap()
                .append_data(&hash160(&bogus))
                .unwrap()
                .append(crate::Opcode::OpEqual)
                .unwrap();
            s
        };
        let mut unlock = Script::new();
        unlock.append_data(&bogus).unwrap();
        assert!(matches!(
            verify(&lock, &unlock),
            Err(ScriptVerificationError::P2shDeserialize(_))
        ));
    }
}
