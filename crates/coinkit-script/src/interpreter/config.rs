//! Interpreter limits.

use serde::{Deserialize, Serialize};

/// Largest serialized script `run` accepts.
pub const MAX_SCRIPT_SIZE: usize = 10_000;
/// Largest element that may be pushed onto the stack.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
/// Non-push operations allowed per script.
pub const MAX_OPS_PER_SCRIPT: usize = 201;
pub const MAX_PUB_KEYS_PER_MULTISIG: usize = 20;
/// BIP16 switch-over time, 2012-04-01 00:00:00 UTC.
pub const P2SH_ACTIVATION_TIMESTAMP: u32 = 1_333_238_400;

/// Limits and switches applied while executing scripts.
///
/// The default matches consensus. Every field may be omitted when
/// deserializing, in which case the default is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_script_size: usize,
    pub max_script_element_size: usize,
    pub max_ops_per_script: usize,
    pub max_pub_keys_per_multisig: usize,
    /// Block time from which P2SH redeem scripts are evaluated.
    pub p2sh_activation_timestamp: u32,
    /// Enables CAT, SPLIT, AND, OR, XOR, DIV, MOD, NUM2BIN and BIN2NUM.
    pub monolith_opcodes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_script_size: MAX_SCRIPT_SIZE,
            max_script_element_size: MAX_SCRIPT_ELEMENT_SIZE,
            max_ops_per_script: MAX_OPS_PER_SCRIPT,
            max_pub_keys_per_multisig: MAX_PUB_KEYS_PER_MULTISIG,
            p2sh_activation_timestamp: P2SH_ACTIVATION_TIMESTAMP,
            monolith_opcodes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_consensus() {
        let cfg = Config::default();
        assert_eq!(cfg.max_script_size, 10_000);
        assert_eq!(cfg.max_script_element_size, 520);
        assert_eq!(cfg.max_ops_per_script, 201);
        assert_eq!(cfg.max_pub_keys_per_multisig, 20);
        assert_eq!(cfg.p2sh_activation_timestamp, 1_333_238_400);
        assert!(cfg.monolith_opcodes);
    }

    /// Missing fields fall back to their defaults.
    #[test]
    fn test_partial_json() {
        let cfg: Config = serde_json::from_str(r#"{"monolith_opcodes": false}"#).unwrap();
        assert!(!cfg.monolith_opcodes);
        assert_eq!(cfg.max_ops_per_script, MAX_OPS_PER_SCRIPT);
    }
}
