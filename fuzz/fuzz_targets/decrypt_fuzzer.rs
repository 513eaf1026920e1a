//! Fuzz target for the retrieval decryption path
//!
//! # Strategy
//!
//! - Arbitrary envelope bytes and key material through `decrypt_secret`
//! - No password is supplied, so password-source envelopes exercise the
//!   missing-password rejection without paying for Argon2 per input
//!
//! # Invariants
//!
//! - NEVER panic, whatever the envelope claims
//! - Every failure is the single collapsed `DecryptionFailed` error
//! - Fabricated ciphertext never authenticates (no accidental plaintext)

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealbox_core::{SecretError, decrypt_secret};
use sealbox_crypto::SecretKey;

#[derive(Debug, Arbitrary)]
struct Input {
    envelope: Vec<u8>,
    key: [u8; 32],
}

fuzz_target!(|input: Input| {
    let key = SecretKey::from_bytes(input.key);

    if let Err(error) = decrypt_secret(&input.envelope, &key, None) {
        assert_eq!(error, SecretError::DecryptionFailed);
    }
});
