//! End-to-end tests for the coinkit-transaction crate.
//!
//! Covers a BTC testnet spend (legacy digest) and a BCH mainnet spend
//! (fork-id digest) byte for byte, then signs and verifies multisig and
//! conditional scripts, bare and behind P2SH.

use coinkit_primitives::chainhash::TxHash;
use coinkit_primitives::ec::PrivateKey;
use coinkit_script::interpreter::{ScriptVerificationError, SignatureError};
use coinkit_script::Script;

use crate::error::TransactionError;
use crate::input::{OutPoint, TransactionInput, DEFAULT_SEQUENCE_NUMBER};
use crate::output::TransactionOutput;
use crate::sighash::{forkid, SighashType};
use crate::template::{p2pkh, sign_input, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::verify::verify_transaction;

/// A block time after P2SH activation.
const NOW: u32 = 1_700_000_000;

// -----------------------------------------------------------------------
// BTC testnet vector (legacy digest)
// -----------------------------------------------------------------------

/// Spends output 1 of testnet tx 1524ca4e…88231 to a P2PKH output and change.
const BTC_UNSIGNED_TX: &str = "010000000131820866b6f840db0eeec1b5ecc44092869ebc72d4ff5e76b46690eb4eca24150100000000ffffffff0280f0fa02000000001976a9149f9a7abd600c0caa03983a77c8c3df8e062cb2fa88ace1677f06000000001976a9142a539adfd7aefcc02e0196b4ccf76aea88a1f47088ac00000000";
const BTC_SIGNED_TX: &str = "010000000131820866b6f840db0eeec1b5ecc44092869ebc72d4ff5e76b46690eb4eca2415010000008a473044022074ddd327544e982d8dd53514406a77a96de47f40c186e58cafd650dd71ea522702204f67c558cc8e771581c5dda630d0dfff60d15e43bf13186669392936ec539d030141047e000cc16c9a4d38cb1572b9dc34c1452626aa170b46150d0e806be1b42517f0832c8a58f543128083ffb8632bae94dd5f3e1e89fad0a17f64ed8bbbb90b5753ffffffff0280f0fa02000000001976a9149f9a7abd600c0caa03983a77c8c3df8e062cb2fa88ace1677f06000000001976a9142a539adfd7aefcc02e0196b4ccf76aea88a1f47088ac00000000";
const BTC_UTXO_SCRIPT: &str = "76a9142a539adfd7aefcc02e0196b4ccf76aea88a1f47088ac";
const BTC_UTXO_VALUE: u64 = 169_012_961;
const BTC_PRIVATE_KEY: &str = "a2359719d3dc9f1539c593e477dc9d57b9653a18e7c94299d87a95ed13525eae";

fn btc_utxo() -> TransactionOutput {
    TransactionOutput {
        value: BTC_UTXO_VALUE,
        locking_script: hex::decode(BTC_UTXO_SCRIPT).expect("valid hex"),
    }
}

#[test]
fn test_btc_parse_unsigned() {
    let tx = Transaction::from_hex(BTC_UNSIGNED_TX).expect("valid tx");
    assert_eq!(tx.version, 1);
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(
        tx.inputs[0].previous_output.hash.to_string(),
        "1524ca4eeb9066b4765effd472bc9e869240c4ecb5c1ee0edb40f8b666088231"
    );
    assert_eq!(tx.inputs[0].previous_output.index, 1);
    assert_eq!(tx.inputs[0].sequence, DEFAULT_SEQUENCE_NUMBER);
    assert_eq!(tx.outputs[0].value, 50_000_000);
    assert_eq!(tx.outputs[1].value, BTC_UTXO_VALUE - 50_000_000 - 10_000_000);
    assert_eq!(tx.to_hex(), BTC_UNSIGNED_TX);
}

#[test]
fn test_btc_legacy_sighash() {
    let tx = Transaction::from_hex(BTC_UNSIGNED_TX).expect("valid tx");
    let digest = tx.signature_hash(&btc_utxo(), 0, SighashType::BTC_ALL).unwrap();
    assert_eq!(
        hex::encode(digest),
        "fd2f20da1c28b008abcce8a8ac7e1a7687fc944e001a24fc3aacb6a7570a3d0f"
    );
}

/// The digest ignores whatever unlocking script the input already carries.
#[test]
fn test_btc_sighash_same_after_signing() {
    let unsigned = Transaction::from_hex(BTC_UNSIGNED_TX).expect("valid tx");
    let signed = Transaction::from_hex(BTC_SIGNED_TX).expect("valid tx");
    let utxo = btc_utxo();
    assert_eq!(
        unsigned.signature_hash(&utxo, 0, SighashType::BTC_ALL),
        signed.signature_hash(&utxo, 0, SighashType::BTC_ALL)
    );
}

/// RFC6979 signing reproduces the signature found on chain.
#[test]
fn test_btc_sign_reproduces_transaction() {
    let key = PrivateKey::from_hex(BTC_PRIVATE_KEY).expect("valid key");
    assert_eq!(
        hex::encode(key.pub_key().uncompressed().hash160()),
        "2a539adfd7aefcc02e0196b4ccf76aea88a1f470"
    );

    let mut tx = Transaction::from_hex(BTC_UNSIGNED_TX).expect("valid tx");
    let utxo = btc_utxo();
    let digest = tx.signature_hash(&utxo, 0, SighashType::BTC_ALL).unwrap();
    assert_eq!(
        hex::encode(key.sign(&digest).unwrap().to_der()),
        "3044022074ddd327544e982d8dd53514406a77a96de47f40c186e58cafd650dd71ea522702204f67c558cc8e771581c5dda630d0dfff60d15e43bf13186669392936ec539d03"
    );

    let unlocker = p2pkh::unlock(key, SighashType::BTC_ALL).with_uncompressed_key();
    tx.inputs[0].signature_script = unlocker.sign(&tx, &utxo, 0).unwrap().into_bytes();
    assert_eq!(tx.to_hex(), BTC_SIGNED_TX);
    assert_eq!(
        tx.tx_id().to_string(),
        "0189910c263c4d416d5c5c2cf70744f9f6bcd5feaf0b149b02e5d88afbe78992"
    );
}

#[test]
fn test_btc_verify_signed() {
    let tx = Transaction::from_hex(BTC_SIGNED_TX).expect("valid tx");
    assert_eq!(verify_transaction(&tx, 0, &btc_utxo(), NOW), Ok(true));
}

/// The signature does not unlock an output locked to another key hash.
#[test]
fn test_btc_verify_wrong_utxo_script() {
    let tx = Transaction::from_hex(BTC_SIGNED_TX).expect("valid tx");
    let mut utxo = btc_utxo();
    utxo.locking_script[3] ^= 0x01;
    assert!(verify_transaction(&tx, 0, &utxo, NOW).is_err());
}

// -----------------------------------------------------------------------
// BCH mainnet vector (fork-id digest)
// -----------------------------------------------------------------------

/// Spends output 2 of 050d00e2…2b8ce2: 600 to one address, 4325 change.
const BCH_UNSIGNED_TX: &str = "0100000001e28c2b955293159898e34c6840d99bf4d390e2ee1c6f606939f18ee1e2000d050200000000ffffffff0258020000000000001976a914769bdff96a02f9135a1d19b749db6a78fe07dc9088ace5100000000000001976a9149e089b6889e032d46e3b915a3392edfd616fb1c488ac00000000";
const BCH_SIGNED_TX: &str = "0100000001e28c2b955293159898e34c6840d99bf4d390e2ee1c6f606939f18ee1e2000d05020000006b483045022100b70d158b43cbcded60e6977e93f9a84966bc0cec6f2dfd1463d1223a90563f0d02207548d081069de570a494d0967ba388ff02641d91cadb060587ead95a98d4e3534121038eab72ec78e639d02758e7860cdec018b49498c307791f785aa3019622f4ea5bffffffff0258020000000000001976a914769bdff96a02f9135a1d19b749db6a78fe07dc9088ace5100000000000001976a9149e089b6889e032d46e3b915a3392edfd616fb1c488ac00000000";

const BCH_PRIVATE_KEY: &str = "7fdafb9db5bc501f2096e7d13d331dc7a75d9594af3d251313ba8b6200f4e384";

fn bch_utxo() -> TransactionOutput {
    TransactionOutput {
        value: 5151,
        locking_script: hex::decode("76a914aff1e0789e5fe316b729577665aa0a04d5b0f8c788ac")
            .expect("valid hex"),
    }
}

#[test]
fn test_bch_precursor_hashes() {
    let tx = Transaction::from_hex(BCH_UNSIGNED_TX).expect("valid tx");
    assert_eq!(
        hex::encode(forkid::hash_prevouts(&tx)),
        "92fd2522986c2c335fef0e3fd8a70f838da0402834f6444d0ae5a369278d4d26"
    );
    assert_eq!(
        hex::encode(forkid::hash_sequence(&tx)),
        "3bb13029ce7b1f559ef5e747fcac439f1455a2ec7c5f09b72290795e70665044"
    );
    assert_eq!(
        hex::encode(forkid::hash_outputs(&tx, None)),
        "729d6e07e0048f5503a394692163c44a5dac384b3e0dbab7a0d3b63dd6103965"
    );
}

#[test]
fn test_bch_forkid_sighash() {
    let tx = Transaction::from_hex(BCH_UNSIGNED_TX).expect("valid tx");
    let digest = tx.signature_hash(&bch_utxo(), 0, SighashType::BCH_ALL).unwrap();
    assert_eq!(
        hex::encode(digest),
        "1136d4975aee4ff6ccf0b8a9c640532f563b48d9856fdc9682c37a071702937c"
    );
}

#[test]
fn test_bch_signed_txid() {
    let tx = Transaction::from_hex(BCH_SIGNED_TX).expect("valid tx");
    assert_eq!(
        tx.tx_id().to_string(),
        "96ee20002b34e468f9d3c5ee54f6a8ddaa61c118889c4f35395c2cd93ba5bbb4"
    );
    assert_eq!(tx.to_hex(), BCH_SIGNED_TX);
}

#[test]
fn test_bch_sign_reproduces_transaction() {
    let key = PrivateKey::from_hex(BCH_PRIVATE_KEY).expect("valid key");
    let mut tx = Transaction::from_hex(BCH_UNSIGNED_TX).expect("valid tx");
    let unlocker = p2pkh::unlock(key, SighashType::BCH_ALL);
    tx.inputs[0].signature_script = unlocker.sign(&tx, &bch_utxo(), 0).unwrap().into_bytes();
    assert_eq!(tx.to_hex(), BCH_SIGNED_TX);
}

#[test]
fn test_bch_verify_signed() {
    let tx = Transaction::from_hex(BCH_SIGNED_TX).expect("valid tx");
    assert_eq!(verify_transaction(&tx, 0, &bch_utxo(), NOW), Ok(true));
}

/// Flipping any byte of the signature push fails verification without
/// panicking.
#[test]
fn test_bch_verify_tampered_signature() {
    let tx = Transaction::from_hex(BCH_SIGNED_TX).expect("valid tx");
    let utxo = bch_utxo();
    // Script: 0x48 <71-byte DER ‖ hash type> 0x21 <33-byte key>.
    for i in 1..=0x48 {
        let mut tampered = tx.clone();
        tampered.inputs[0].signature_script[i] ^= 0x01;
        assert_ne!(
            verify_transaction(&tampered, 0, &utxo, NOW),
            Ok(true),
            "byte {} flipped",
            i
        );
    }
}

/// A BCH signature does not verify under the legacy digest.
#[test]
fn test_bch_signature_is_not_legacy() {
    let mut tx = Transaction::from_hex(BCH_SIGNED_TX).expect("valid tx");
    let script = &mut tx.inputs[0].signature_script;
    script[0x48] = SighashType::BTC_ALL.to_byte();
    assert!(verify_transaction(&tx, 0, &bch_utxo(), NOW).is_err());
}

// -----------------------------------------------------------------------
// Parsing edge cases
// -----------------------------------------------------------------------

#[test]
fn test_is_coinbase() {
    let tx = Transaction::from_hex(
        "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff025151ffffffff010000000000000000015100000000",
    )
    .expect("valid tx");
    assert!(tx.is_coinbase());
    assert!(!Transaction::from_hex(BCH_SIGNED_TX).unwrap().is_coinbase());
}

#[test]
fn test_trailing_bytes_error() {
    let extended = format!("{}00", BCH_SIGNED_TX);
    assert!(Transaction::from_hex(&extended).is_err());
}

#[test]
fn test_truncated_error() {
    let truncated = &BCH_SIGNED_TX[..BCH_SIGNED_TX.len() - 2];
    assert!(Transaction::from_hex(truncated).is_err());
    assert!(Transaction::from_bytes(&[]).is_err());
    assert!(Transaction::from_hex("not hex").is_err());
}

#[test]
fn test_empty_transaction_serialization() {
    let tx = Transaction::new();
    assert_eq!(tx.to_hex(), "01000000000000000000");
    assert_eq!(Transaction::from_hex(&tx.to_hex()).unwrap(), tx);
}

// -----------------------------------------------------------------------
// Verification errors
// -----------------------------------------------------------------------

#[test]
fn test_verify_input_out_of_range() {
    let tx = Transaction::from_hex(BCH_SIGNED_TX).expect("valid tx");
    assert_eq!(
        verify_transaction(&tx, 1, &bch_utxo(), NOW),
        Err(ScriptVerificationError::InputIndexOutOfRange { index: 1, count: 1 })
    );
}

#[test]
fn test_verify_unparseable_unlocking_script() {
    let mut tx = Transaction::from_hex(BCH_SIGNED_TX).expect("valid tx");
    tx.inputs[0].signature_script = vec![0x4c];
    assert!(matches!(
        verify_transaction(&tx, 0, &bch_utxo(), NOW),
        Err(ScriptVerificationError::Parse(_))
    ));
}

#[test]
fn test_sign_input_errors() {
    let tx = Transaction::from_hex(BCH_UNSIGNED_TX).expect("valid tx");
    let key = mock_key(0x11);
    assert!(matches!(
        sign_input(&tx, &bch_utxo(), 1, &key, SighashType::BCH_ALL),
        Err(TransactionError::InvalidTransaction(_))
    ));
    assert!(matches!(
        sign_input(&tx, &bch_utxo(), 0, &key, SighashType::from_byte(0x40)),
        Err(TransactionError::Signature(SignatureError::InvalidHashType(0x40)))
    ));
}

// -----------------------------------------------------------------------
// Mock spends: multisig and conditional scripts
// -----------------------------------------------------------------------

const MOCK_UTXO_VALUE: u64 = 100_000_000;
const MOCK_AMOUNT: u64 = 10_000;
const MOCK_FEE: u64 = 1000;

fn mock_key(byte: u8) -> PrivateKey {
    PrivateKey::from_bytes(&[byte; 32]).expect("valid key")
}

struct MockKeys {
    a: PrivateKey,
    b: PrivateKey,
    c: PrivateKey,
    d: PrivateKey,
}

fn mock_keys() -> MockKeys {
    MockKeys {
        a: mock_key(0x11),
        b: mock_key(0x22),
        c: mock_key(0x33),
        d: mock_key(0x44),
    }
}

/// A version 1 transaction spending `lock`, paying an amount away and the
/// rest back to `lock`.
fn mock_spend(lock: &Script) -> (Transaction, TransactionOutput) {
    let utxo = TransactionOutput::new(MOCK_UTXO_VALUE, lock);
    let mut tx = Transaction::new();
    tx.inputs.push(TransactionInput::new(OutPoint::new(TxHash::new([0x42; 32]), 0)));
    tx.outputs.push(TransactionOutput::new(MOCK_AMOUNT, &p2pkh::lock(&[0x01; 20])));
    tx.outputs.push(TransactionOutput::new(MOCK_UTXO_VALUE - MOCK_AMOUNT - MOCK_FEE, lock));
    (tx, utxo)
}

/// Sign with each of `keys` in order, let `unlock` build the unlocking
/// script from the signatures, and verify.
fn verify_with(
    lock: &Script,
    keys: &[&PrivateKey],
    unlock: impl FnOnce(&[String]) -> String,
) -> Result<bool, ScriptVerificationError> {
    let (mut tx, utxo) = mock_spend(lock);
    let sigs: Vec<String> = keys
        .iter()
        .map(|key| {
            let sig = sign_input(&tx, &utxo, 0, key, SighashType::BCH_ALL).expect("signs");
            hex::encode(sig)
        })
        .collect();
    let unlock = Script::from_asm(&unlock(&sigs)).expect("valid asm");
    tx.inputs[0].signature_script = unlock.into_bytes();
    verify_transaction(&tx, 0, &utxo, NOW)
}

fn pub_hex(key: &PrivateKey) -> String {
    key.pub_key().to_hex()
}

fn one_of_three(keys: &MockKeys) -> Script {
    Script::build_multisig(1, &[keys.a.pub_key(), keys.b.pub_key(), keys.c.pub_key()])
        .expect("valid multisig")
}

#[test]
fn test_standard_1_of_3() {
    let keys = mock_keys();
    let lock = one_of_three(&keys);
    for key in [&keys.a, &keys.b, &keys.c] {
        assert_eq!(verify_with(&lock, &[key], |s| format!("OP_0 {}", s[0])), Ok(true));
    }
    assert_ne!(verify_with(&lock, &[&keys.d], |s| format!("OP_0 {}", s[0])), Ok(true));
}

#[test]
fn test_p2sh_1_of_3() {
    let keys = mock_keys();
    let redeem = one_of_three(&keys);
    let lock = redeem.to_p2sh();
    let unlock = |s: &[String]| format!("OP_0 {} {}", s[0], redeem.to_hex());
    for key in [&keys.a, &keys.b, &keys.c] {
        assert_eq!(verify_with(&lock, &[key], unlock), Ok(true));
    }
    assert_ne!(verify_with(&lock, &[&keys.d], unlock), Ok(true));
}

/// Signatures must appear in the same order as their keys.
#[test]
fn test_standard_2_of_3() {
    let keys = mock_keys();
    let lock = Script::build_multisig(2, &[keys.a.pub_key(), keys.b.pub_key(), keys.c.pub_key()])
        .expect("valid multisig");
    let unlock = |s: &[String]| format!("OP_0 {} {}", s[0], s[1]);

    for pair in [[&keys.a, &keys.b], [&keys.a, &keys.c], [&keys.b, &keys.c]] {
        assert_eq!(verify_with(&lock, &pair, unlock), Ok(true));
    }
    for pair in [[&keys.a, &keys.d], [&keys.b, &keys.d], [&keys.c, &keys.d], [&keys.b, &keys.a]] {
        assert_ne!(verify_with(&lock, &pair, unlock), Ok(true));
    }
}

/// `IF IF <A> ELSE <B> ENDIF ELSE <C> ENDIF` selecting one key hash to
/// check against.
fn conditional(keys: &MockKeys) -> Script {
    let hash = |key: &PrivateKey| hex::encode(key.pub_key().hash160());
    Script::from_asm(&format!(
        "OP_IF OP_IF OP_DUP OP_HASH160 {} OP_ELSE OP_DUP OP_HASH160 {} OP_ENDIF \
         OP_ELSE OP_DUP OP_HASH160 {} OP_ENDIF OP_EQUALVERIFY OP_CHECKSIG",
        hash(&keys.a),
        hash(&keys.b),
        hash(&keys.c)
    ))
    .expect("valid asm")
}

/// Branch selectors pushed after `<sig> <pubkey>`: A takes both IFs, B the
/// outer IF and inner ELSE, C the outer ELSE.
fn branch_for(keys: &MockKeys, key: &PrivateKey) -> &'static str {
    if key.to_bytes() == keys.b.to_bytes() {
        "OP_0 OP_1"
    } else if key.to_bytes() == keys.c.to_bytes() {
        "OP_0"
    } else {
        "OP_1 OP_1"
    }
}

#[test]
fn test_custom_conditional() {
    let keys = mock_keys();
    let lock = conditional(&keys);
    for key in [&keys.a, &keys.b, &keys.c, &keys.d] {
        let branch = branch_for(&keys, key);
        let result = verify_with(&lock, &[key], |s| format!("{} {} {}", s[0], pub_hex(key), branch));
        if key.to_bytes() == keys.d.to_bytes() {
            assert!(result.is_err(), "key D should not unlock branch A");
        } else {
            assert_eq!(result, Ok(true));
        }
    }
}

#[test]
fn test_p2sh_custom_conditional() {
    let keys = mock_keys();
    let redeem = conditional(&keys);
    let lock = redeem.to_p2sh();
    for key in [&keys.a, &keys.b, &keys.c, &keys.d] {
        let branch = branch_for(&keys, key);
        let result = verify_with(&lock, &[key], |s| {
            format!("{} {} {} {}", s[0], pub_hex(key), branch, redeem.to_hex())
        });
        if key.to_bytes() == keys.d.to_bytes() {
            assert_ne!(result, Ok(true));
        } else {
            assert_eq!(result, Ok(true));
        }
    }
}

/// A key that signed for one branch cannot satisfy another.
#[test]
fn test_conditional_wrong_branch() {
    let keys = mock_keys();
    let lock = conditional(&keys);
    let result = verify_with(&lock, &[&keys.a], |s| format!("{} {} OP_0", s[0], pub_hex(&keys.a)));
    assert!(result.is_err());
}

// -----------------------------------------------------------------------
// Lock times through the transaction
// -----------------------------------------------------------------------

fn verify_locked(lock_asm: &str, version: u32, lock_time: u32, sequence: u32) -> Result<bool, ScriptVerificationError> {
    let lock = Script::from_asm(lock_asm).expect("valid asm");
    let (mut tx, utxo) = mock_spend(&lock);
    tx.version = version;
    tx.lock_time = lock_time;
    tx.inputs[0].sequence = sequence;
    verify_transaction(&tx, 0, &utxo, NOW)
}

#[test]
fn test_check_lock_time_verify() {
    // 500, little-endian.
    let lock = "f401 OP_CHECKLOCKTIMEVERIFY OP_DROP OP_1";
    assert_eq!(verify_locked(lock, 1, 500, 0xffff_fffe), Ok(true));
    assert!(verify_locked(lock, 1, 499, 0xffff_fffe).is_err());
    assert!(verify_locked(lock, 1, 500, DEFAULT_SEQUENCE_NUMBER).is_err());
}

#[test]
fn test_check_sequence_verify() {
    let lock = "OP_10 OP_CHECKSEQUENCEVERIFY OP_DROP OP_1";
    assert_eq!(verify_locked(lock, 2, 0, 10), Ok(true));
    assert!(verify_locked(lock, 2, 0, 9).is_err());
    assert!(verify_locked(lock, 1, 0, 10).is_err());
}
