#![no_main]

use libfuzzer_sys::fuzz_target;
use restrand::vlq;

fuzz_target!(|data: &[u8]| {
    // Treat the input as a stream of i32s (4 bytes each, little-endian) to encode and round-trip.
    for chunk in data.chunks_exact(4) {
        let n = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let encoded = vlq::encode(n as i64);
        let (decoded, rest) = vlq::decode_one(encoded.as_bytes()).expect("round-trip decode must succeed");
        assert_eq!(decoded, n);
        assert!(rest.is_empty());
    }

    // Also feed the raw bytes straight into the decoder: it must never panic, only error.
    let _ = vlq::decode_all(data);
});
