use proptest::prelude::*;

use coinkit_script::chunk::{parse, serialize};
use coinkit_script::interpreter::scriptnum::minimally_encode;
use coinkit_script::interpreter::{ExecutionContext, ScriptMachine, ScriptNumber};
use coinkit_script::{Opcode, PushEncoding, Script, ScriptChunk};

fn push_number(encoded: &[u8]) -> Script {
    let mut script = Script::new();
    if encoded.is_empty() {
        script.append(Opcode::Op0).unwrap();
    } else {
        script.append_data(encoded).unwrap();
    }
    script
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Whatever parses serializes back to the same bytes.
    #[test]
    fn chunk_parse_serialize_roundtrip(data in prop::collection::vec(any::<u8>(), 0..512)) {
        if let Ok(chunks) = parse(&data) {
            let out = serialize(&chunks);
            prop_assert_eq!(&data, &out);
            prop_assert_eq!(parse(&out).unwrap(), chunks);
        }
    }

    #[test]
    fn script_hex_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(script) = Script::parse(&data) {
            let again = Script::from_hex(&script.to_hex()).unwrap();
            prop_assert_eq!(again.bytes(), &data[..]);
        }
    }

    #[test]
    fn script_number_roundtrip(value in -0x7FFF_FFFF_FFFFi64..=0x7FFF_FFFF_FFFFi64) {
        let bytes = ScriptNumber::new(value).to_bytes();
        prop_assert_eq!(ScriptNumber::from_bytes(&bytes, 8).unwrap().value(), value);
        prop_assert_eq!(minimally_encode(&bytes), bytes);
    }

    /// A number pushed by the unlocking script compares equal to the same
    /// number pushed by the locking script.
    #[test]
    fn script_number_survives_execution(value in -0x7FFF_FFFFi64..=0x7FFF_FFFFi64) {
        let encoded = ScriptNumber::new(value).to_bytes();
        let unlock = push_number(&encoded);
        let mut lock = push_number(&encoded);
        lock.append(Opcode::OpNumEqual).unwrap();
        let mut ctx = ExecutionContext::new();
        prop_assert_eq!(ScriptMachine::verify(&lock, &unlock, &mut ctx), Ok(true));
    }

    /// The builder always picks the shortest push encoding.
    #[test]
    fn builder_uses_minimal_push(data in prop::collection::vec(any::<u8>(), 1..600)) {
        let mut script = Script::new();
        script.append_data(&data).unwrap();
        let chunk = &script.chunks()[0];
        prop_assert_eq!(chunk.pushed_data(), Some(&data[..]));
        match chunk {
            ScriptChunk::Push { encoding, .. } => {
                prop_assert_eq!(*encoding, PushEncoding::minimal_for(data.len()));
            }
            other => prop_assert!(false, "expected a push, got {}", other),
        }
        prop_assert_eq!(Script::parse(script.bytes()).unwrap(), script);
    }
}
