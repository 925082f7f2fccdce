use proptest::prelude::*;

use coinkit_primitives::chainhash::TxHash;
use coinkit_transaction::sighash::legacy::SIGHASH_ONE;
use coinkit_transaction::{OutPoint, SighashType, Transaction, TransactionInput, TransactionOutput};

/// Strategy to generate a random transaction. Scripts are arbitrary bytes
/// and need not parse.
fn arb_transaction() -> impl Strategy<Value = Transaction> {
    let arb_input = (
        prop::array::uniform32(any::<u8>()),
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 0..64),
        any::<u32>(),
    )
        .prop_map(|(hash, index, signature_script, sequence)| TransactionInput {
            previous_output: OutPoint::new(TxHash::new(hash), index),
            signature_script,
            sequence,
        });

    let arb_output = (any::<u64>(), prop::collection::vec(any::<u8>(), 0..64))
        .prop_map(|(value, locking_script)| TransactionOutput { value, locking_script });

    (
        any::<u32>(),
        prop::collection::vec(arb_input, 1..4),
        prop::collection::vec(arb_output, 1..4),
        any::<u32>(),
    )
        .prop_map(|(version, inputs, outputs, lock_time)| Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
}

fn arb_utxo() -> impl Strategy<Value = TransactionOutput> {
    (any::<u64>(), prop::collection::vec(any::<u8>(), 0..64))
        .prop_map(|(value, locking_script)| TransactionOutput { value, locking_script })
}

/// Every hash type with a defined base, with and without the fork-id bit.
fn arb_sighash_type() -> impl Strategy<Value = SighashType> {
    (1u8..=3, any::<bool>(), any::<bool>()).prop_map(|(base, fork_id, anyone_can_pay)| {
        let mut byte = base;
        if fork_id {
            byte |= 0x40;
        }
        if anyone_can_pay {
            byte |= 0x80;
        }
        SighashType::from_byte(byte)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transaction_serialize_deserialize_roundtrip(tx in arb_transaction()) {
        let bytes = tx.to_bytes();
        let tx2 = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&tx2, &tx);
        prop_assert_eq!(tx2.to_bytes(), bytes);
    }

    #[test]
    fn transaction_hex_roundtrip(tx in arb_transaction()) {
        let tx2 = Transaction::from_hex(&tx.to_hex()).unwrap();
        prop_assert_eq!(tx.tx_id(), tx2.tx_id());
    }

    /// The digest is a pure function of its inputs and never depends on the
    /// unlocking scripts already present.
    #[test]
    fn sighash_is_deterministic(
        tx in arb_transaction(),
        utxo in arb_utxo(),
        hash_type in arb_sighash_type(),
        junk in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let first = tx.signature_hash(&utxo, 0, hash_type);
        prop_assert!(first.is_ok());
        prop_assert_eq!(&first, &tx.signature_hash(&utxo, 0, hash_type));

        let mut rescripted = tx.clone();
        for input in &mut rescripted.inputs {
            input.signature_script = junk.clone();
        }
        prop_assert_eq!(first, rescripted.signature_hash(&utxo, 0, hash_type));
    }

    /// Past the last input the legacy digest is the constant one and the
    /// fork-id digest an error.
    #[test]
    fn sighash_out_of_range(tx in arb_transaction(), utxo in arb_utxo()) {
        let index = tx.inputs.len();
        prop_assert_eq!(tx.signature_hash(&utxo, index, SighashType::BTC_ALL), Ok(SIGHASH_ONE));
        prop_assert!(tx.signature_hash(&utxo, index, SighashType::BCH_ALL).is_err());
    }
}
