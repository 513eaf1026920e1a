//! Error taxonomy for secret operations.

use crate::store::StoreError;

/// Errors surfaced by submission and retrieval.
///
/// User-visible messages are terse and deliberately uninformative about
/// *why* a lookup or decryption failed:
///
/// - [`SecretError::SecretNotFound`] collapses absent, expired, exhausted,
///   and destroyed (anti-enumeration).
/// - [`SecretError::DecryptionFailed`] collapses wrong password, tampering,
///   and corruption (anti-oracle).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    /// The plaintext bundle is at or over the configured size limit.
    ///
    /// Surfaced verbatim; the sender recovers by trimming input.
    #[error("secret exceeds the size limit: {actual} bytes (max {max})")]
    SizeLimitExceeded {
        /// Total plaintext size that was submitted.
        actual: u64,
        /// Configured maximum in bytes.
        max: u64,
    },

    /// No readable secret exists under this id.
    #[error("secret not found")]
    SecretNotFound,

    /// The envelope could not be opened with the supplied key material.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Decryption succeeded but the plaintext is not a valid payload.
    ///
    /// Should be rare: it indicates a codec or version mismatch, not an
    /// attack (tampering fails authentication first).
    #[error("malformed payload")]
    MalformedPayload,

    /// The store reported a failure.
    ///
    /// Transient store failures are retryable; they are never reported as
    /// "secret does not exist".
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invariant breach inside the service itself. Indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SecretError {
    /// Whether the caller should retry with backoff rather than surface a
    /// permanent failure.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}
