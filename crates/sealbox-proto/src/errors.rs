//! Error types for payload and envelope codecs.

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Errors produced while encoding or decoding wire formats.
///
/// Decoding fails closed: a corrupt or foreign blob yields an error, never
/// partially-parsed data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtoError {
    /// Payload CBOR could not be decoded into a [`crate::Payload`].
    ///
    /// Seen after successful decryption, this indicates a codec or version
    /// mismatch rather than tampering (tampering fails authentication first).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Payload CBOR serialization failed.
    #[error("payload encoding failed: {0}")]
    PayloadEncode(String),

    /// Buffer ended before the envelope's fixed fields were complete.
    #[error("envelope truncated: need at least {needed} bytes, got {got}")]
    Truncated {
        /// Minimum bytes required to continue parsing.
        needed: usize,
        /// Bytes actually available.
        got: usize,
    },

    /// Leading magic bytes did not identify a Sealbox envelope.
    #[error("invalid envelope magic: {0:#010x}")]
    InvalidMagic(u32),

    /// Envelope version is not understood by this build.
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),

    /// Algorithm tag does not name a supported AEAD construction.
    #[error("unknown algorithm tag: {0:#04x}")]
    UnknownAlgorithm(u8),

    /// Key source tag does not name a supported derivation mode.
    #[error("unknown key source tag: {0:#04x}")]
    UnknownKeySource(u8),

    /// Ciphertext exceeds the maximum secret size.
    #[error("ciphertext too large: {size} bytes (max {max})")]
    CiphertextTooLarge {
        /// Actual ciphertext size in bytes.
        size: usize,
        /// Maximum permitted size in bytes.
        max: usize,
    },
}
