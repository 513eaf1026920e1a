//! Authenticated sealing and opening of envelopes.
//!
//! All functions are pure - random bytes must be provided by the caller.
//! This enables deterministic testing and keeps randomness policy (OS RNG
//! in production, seeded RNG in tests) out of the crypto engine.

use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use sealbox_proto::{Algorithm, Envelope, KeySource, NONCE_SIZE};

use crate::{error::CryptoError, kdf::SecretKey};

/// Seal a plaintext blob into a self-describing envelope.
///
/// The caller chooses the algorithm (server-side policy at creation time)
/// and supplies the nonce randomness; AES-GCM consumes only the first 12
/// bytes of the nonce field.
///
/// # Security
///
/// - Caller MUST provide cryptographically secure random nonce bytes in
///   production; a repeated (key, nonce) pair breaks confidentiality.
/// - The key source travels inside the envelope so the recipient knows
///   whether a password must be re-derived, without any side channel.
pub fn seal(
    plaintext: &[u8],
    key: &SecretKey,
    algorithm: Algorithm,
    key_source: KeySource,
    nonce: [u8; NONCE_SIZE],
) -> Envelope {
    let ciphertext = match algorithm {
        Algorithm::XChaCha20Poly1305 => {
            let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
            let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(&nonce), plaintext) else {
                unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
            };
            ciphertext
        },
        Algorithm::Aes256Gcm => {
            let cipher = Aes256Gcm::new(key.as_bytes().into());
            let gcm_nonce = aes_gcm::Nonce::from_slice(&nonce[..algorithm.nonce_len()]);
            let Ok(ciphertext) = cipher.encrypt(gcm_nonce, plaintext) else {
                unreachable!("AES-256-GCM encryption cannot fail with valid inputs");
            };
            ciphertext
        },
    };

    Envelope { algorithm, key_source, nonce, ciphertext }
}

/// Open an envelope with the given key.
///
/// Dispatches on the envelope's own algorithm tag, so callers stay
/// algorithm-agnostic.
///
/// # Errors
///
/// - [`CryptoError::DecryptionFailed`] if authentication fails. Wrong key
///   (wrong password), tampered ciphertext, and bit rot are deliberately
///   indistinguishable.
pub fn open(envelope: &Envelope, key: &SecretKey) -> Result<Vec<u8>, CryptoError> {
    let ciphertext = envelope.ciphertext.as_slice();

    let result = match envelope.algorithm {
        Algorithm::XChaCha20Poly1305 => {
            let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
            cipher.decrypt(XNonce::from_slice(&envelope.nonce), ciphertext)
        },
        Algorithm::Aes256Gcm => {
            let cipher = Aes256Gcm::new(key.as_bytes().into());
            let nonce_len = envelope.algorithm.nonce_len();
            cipher.decrypt(aes_gcm::Nonce::from_slice(&envelope.nonce[..nonce_len]), ciphertext)
        },
    };

    result.map_err(|_| CryptoError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use sealbox_proto::{SALT_SIZE, TAG_SIZE};

    use super::*;
    use crate::kdf::{KEY_SIZE, derive_password_key};

    fn test_key(byte: u8) -> SecretKey {
        SecretKey::from_bytes([byte; KEY_SIZE])
    }

    #[test]
    fn seal_open_round_trip_xchacha() {
        let key = test_key(1);
        let plaintext = b"attack at dawn";

        let envelope = seal(
            plaintext,
            &key,
            Algorithm::XChaCha20Poly1305,
            KeySource::LinkOnly,
            [0xAB; NONCE_SIZE],
        );
        assert_eq!(open(&envelope, &key).unwrap(), plaintext);
    }

    #[test]
    fn seal_open_round_trip_aes_gcm() {
        let key = test_key(2);
        let plaintext = b"attack at dusk";

        let envelope =
            seal(plaintext, &key, Algorithm::Aes256Gcm, KeySource::LinkOnly, [0x11; NONCE_SIZE]);
        assert_eq!(envelope.algorithm, Algorithm::Aes256Gcm);
        assert_eq!(open(&envelope, &key).unwrap(), plaintext);
    }

    #[test]
    fn round_trip_survives_wire_encoding() {
        let key = test_key(3);
        let plaintext = vec![0x42u8; 64 * 1024]; // 64KB

        let envelope = seal(
            &plaintext,
            &key,
            Algorithm::XChaCha20Poly1305,
            KeySource::LinkOnly,
            [0xFF; NONCE_SIZE],
        );
        let decoded = Envelope::decode(&envelope.encode_to_vec().unwrap()).unwrap();
        assert_eq!(open(&decoded, &key).unwrap(), plaintext);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let key = test_key(4);
        let envelope =
            seal(b"", &key, Algorithm::XChaCha20Poly1305, KeySource::LinkOnly, [0; NONCE_SIZE]);
        assert_eq!(envelope.ciphertext.len(), TAG_SIZE);
        assert_eq!(open(&envelope, &key).unwrap(), b"");
    }

    #[test]
    fn wrong_key_fails() {
        let envelope = seal(
            b"secret",
            &test_key(1),
            Algorithm::XChaCha20Poly1305,
            KeySource::LinkOnly,
            [0; NONCE_SIZE],
        );
        assert_eq!(open(&envelope, &test_key(2)), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = test_key(1);
        let mut envelope = seal(
            b"secret",
            &key,
            Algorithm::Aes256Gcm,
            KeySource::LinkOnly,
            [0; NONCE_SIZE],
        );
        envelope.ciphertext[0] ^= 0xFF;
        assert_eq!(open(&envelope, &key), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn flipped_algorithm_tag_fails_not_panics() {
        let key = test_key(1);
        let mut envelope = seal(
            b"secret",
            &key,
            Algorithm::XChaCha20Poly1305,
            KeySource::LinkOnly,
            [0; NONCE_SIZE],
        );
        // An attacker rewriting the tag gets an authentication failure.
        envelope.algorithm = Algorithm::Aes256Gcm;
        assert_eq!(open(&envelope, &key), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn tampered_nonce_fails() {
        let key = test_key(1);
        let mut envelope = seal(
            b"secret",
            &key,
            Algorithm::XChaCha20Poly1305,
            KeySource::LinkOnly,
            [7; NONCE_SIZE],
        );
        envelope.nonce[0] ^= 0x01;
        assert_eq!(open(&envelope, &key), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn password_derived_round_trip() {
        let link = test_key(9);
        let salt = [3u8; SALT_SIZE];
        let key = derive_password_key(&link, "correct horse", &salt).unwrap();

        let envelope = seal(
            b"payload",
            &key,
            Algorithm::XChaCha20Poly1305,
            KeySource::Password { salt },
            [5; NONCE_SIZE],
        );

        // Recipient re-derives from the envelope's salt and succeeds.
        let KeySource::Password { salt: stored } = envelope.key_source else {
            unreachable!("sealed with a password key source");
        };
        let rederived = derive_password_key(&link, "correct horse", &stored).unwrap();
        assert_eq!(open(&envelope, &rederived).unwrap(), b"payload");

        // A wrong password fails exactly like tampering does.
        let wrong = derive_password_key(&link, "incorrect horse", &stored).unwrap();
        assert_eq!(open(&envelope, &wrong), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn different_nonces_produce_different_ciphertexts() {
        let key = test_key(1);
        let a = seal(b"x", &key, Algorithm::XChaCha20Poly1305, KeySource::LinkOnly, [0; NONCE_SIZE]);
        let b = seal(b"x", &key, Algorithm::XChaCha20Poly1305, KeySource::LinkOnly, [1; NONCE_SIZE]);
        assert_ne!(a.ciphertext, b.ciphertext);
    }
}
