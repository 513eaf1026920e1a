//! Key material and password-hardening derivation.
//!
//! The link key is pure caller-supplied randomness; it rides in the access
//! reference and never touches the store. When the sender sets a password,
//! [`derive_password_key`] folds Argon2id output into the link key with
//! HKDF, so decryption needs both factors.

use argon2::{Argon2, Params, Version};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Symmetric key length (bytes).
pub const KEY_SIZE: usize = 32;

/// HKDF info label binding derived keys to this protocol version.
const KEY_LABEL: &[u8] = b"sealbox.v1.key";

/// A 32-byte symmetric key. Zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_SIZE]);

impl SecretKey {
    /// Wrap raw key bytes (e.g. link-reference randomness).
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes for cipher initialization.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key bytes must never reach logs.
        f.write_str("SecretKey(..)")
    }
}

/// Argon2id parameters pinned by envelope version 1.
///
/// 64 MiB / 3 iterations / 1 lane: slow enough to blunt offline guessing,
/// bounded enough that derivation cannot be abused as a DoS amplifier.
/// Changing these requires a new envelope version.
fn argon2_params() -> Params {
    let Ok(params) = Params::new(64 * 1024, 3, 1, Some(KEY_SIZE)) else {
        unreachable!("static Argon2 parameters are valid");
    };
    params
}

/// Derive the final encryption key from a link key, password, and salt.
///
/// Deterministic: the same three inputs always produce the same key, which
/// is what lets the recipient re-derive it from the access reference plus
/// the out-of-band password. Deliberately slow (memory-hard Argon2id).
///
/// # Errors
///
/// - [`CryptoError::KeyDerivation`] if Argon2 rejects the inputs (salt
///   shorter than its minimum, empty password on some configurations)
pub fn derive_password_key(
    link_key: &SecretKey,
    password: &str,
    salt: &[u8; sealbox_proto::SALT_SIZE],
) -> Result<SecretKey, CryptoError> {
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon2_params());

    let mut prk = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut prk)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    // Bind the hardened password into the link key: possession of the
    // reference alone, or the password alone, is not enough.
    let hkdf = Hkdf::<Sha256>::new(Some(&prk), link_key.as_bytes());
    let mut out = [0u8; KEY_SIZE];
    let Ok(()) = hkdf.expand(KEY_LABEL, &mut out) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    prk.zeroize();

    Ok(SecretKey(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_key(byte: u8) -> SecretKey {
        SecretKey::from_bytes([byte; KEY_SIZE])
    }

    #[test]
    fn derivation_is_deterministic() {
        let salt = [5u8; sealbox_proto::SALT_SIZE];
        let a = derive_password_key(&link_key(1), "hunter2", &salt).unwrap();
        let b = derive_password_key(&link_key(1), "hunter2", &salt).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_passwords_produce_different_keys() {
        let salt = [5u8; sealbox_proto::SALT_SIZE];
        let a = derive_password_key(&link_key(1), "hunter2", &salt).unwrap();
        let b = derive_password_key(&link_key(1), "hunter3", &salt).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let a = derive_password_key(&link_key(1), "pw", &[0u8; sealbox_proto::SALT_SIZE])
            .unwrap();
        let b = derive_password_key(&link_key(1), "pw", &[1u8; sealbox_proto::SALT_SIZE])
            .unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_link_keys_produce_different_keys() {
        let salt = [9u8; sealbox_proto::SALT_SIZE];
        let a = derive_password_key(&link_key(1), "pw", &salt).unwrap();
        let b = derive_password_key(&link_key(2), "pw", &salt).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn derived_key_differs_from_link_key() {
        let salt = [9u8; sealbox_proto::SALT_SIZE];
        let lk = link_key(7);
        let derived = derive_password_key(&lk, "pw", &salt).unwrap();
        assert_ne!(derived.as_bytes(), lk.as_bytes());
    }

    #[test]
    fn debug_does_not_leak_key_bytes() {
        let rendered = format!("{:?}", link_key(0xAA));
        assert!(!rendered.contains("aa"));
        assert!(!rendered.contains("170"));
    }
}
