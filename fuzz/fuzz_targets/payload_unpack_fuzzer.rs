//! Fuzz target for payload CBOR unpacking
//!
//! # Strategy
//!
//! - Random bytes: completely arbitrary CBOR data (general malformation)
//! - Deeply nested and huge-length CBOR comes free from the corpus
//!
//! # Invariants
//!
//! - NEVER panic on malformed CBOR
//! - A successful unpack repacks and unpacks to the same payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealbox_proto::Payload;

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = Payload::unpack(data) {
        let repacked = payload.pack().expect("unpacked payload must repack");
        let reparsed = Payload::unpack(&repacked).expect("repacked payload must unpack");
        assert_eq!(reparsed, payload);
    }
});
