#![no_main]
use libfuzzer_sys::fuzz_target;
use ocvault::codec;

// Decoding must never panic, and anything that decodes must re-encode to a
// prefix of the input (trailing bytes are ignored by the decoder).
fuzz_target!(|data: &[u8]| {
    if let Ok(manifest) = codec::decode(data) {
        let encoded = codec::encode(&manifest);
        assert!(data.starts_with(&encoded));
    }
});
