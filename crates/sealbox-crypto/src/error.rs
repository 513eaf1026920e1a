//! Crypto engine errors.

/// Errors from key derivation and AEAD operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// Key derivation could not run (invalid parameter combination).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Authenticated decryption failed.
    ///
    /// Deliberately carries no detail: wrong password, tampering, and
    /// corruption are indistinguishable to prevent oracle attacks.
    #[error("decryption failed")]
    DecryptionFailed,
}
