//! Self-describing ciphertext envelope.
//!
//! Wire layout (all multi-byte integers big-endian):
//!
//! ```text
//! [magic: 4 bytes][version: 1][algorithm: 1][key source: 1]
//! [salt: 16 bytes, present iff key source = Password]
//! [nonce: 24 bytes][ciphertext incl. 16-byte auth tag: variable]
//! ```
//!
//! The envelope carries everything a recipient needs except the key: the
//! AEAD algorithm, whether a password was folded into the key (and the salt
//! for re-deriving it), and the nonce. The recipient receives only the
//! secret id and optional password out of band.
//!
//! # Invariants
//!
//! - Round-trip: `decode(encode(e)) == e` for every valid envelope.
//! - Decode validates structure before allocating for the ciphertext.
//! - The version byte pins key-derivation parameters; readers of version 1
//!   envelopes must keep working as parameters evolve under later versions.

use bytes::BufMut;

use crate::errors::{ProtoError, Result};

/// Salt length for password-derived keys (bytes).
pub const SALT_SIZE: usize = 16;

/// Nonce field length (bytes). Sized for XChaCha20; AES-GCM uses a prefix.
pub const NONCE_SIZE: usize = 24;

/// AEAD authentication tag length (bytes), identical for both algorithms.
pub const TAG_SIZE: usize = 16;

/// AEAD construction used to seal a secret.
///
/// Selected by server-side policy at creation time and embedded in the
/// envelope so retrieval is algorithm-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// XChaCha20-Poly1305 (24-byte nonce). The default.
    XChaCha20Poly1305,
    /// AES-256-GCM (12-byte nonce, taken from the nonce field prefix).
    Aes256Gcm,
}

impl Algorithm {
    /// Wire tag for this algorithm.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::XChaCha20Poly1305 => 0x01,
            Self::Aes256Gcm => 0x02,
        }
    }

    /// Parse a wire tag. `None` for unknown tags.
    #[must_use]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::XChaCha20Poly1305),
            0x02 => Some(Self::Aes256Gcm),
            _ => None,
        }
    }

    /// Nonce length actually consumed by this algorithm.
    #[must_use]
    pub const fn nonce_len(self) -> usize {
        match self {
            Self::XChaCha20Poly1305 => 24,
            Self::Aes256Gcm => 12,
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XChaCha20Poly1305 => write!(f, "xchacha20-poly1305"),
            Self::Aes256Gcm => write!(f, "aes-256-gcm"),
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "xchacha20-poly1305" => Ok(Self::XChaCha20Poly1305),
            "aes-256-gcm" => Ok(Self::Aes256Gcm),
            other => Err(format!("unknown algorithm: {other}")),
        }
    }
}

/// How the decryption key is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key is the random material embedded in the access reference.
    LinkOnly,
    /// Key additionally incorporates a user-supplied password, hardened with
    /// the stored salt. The salt is public; the password is not.
    Password {
        /// Salt fed to the password KDF.
        salt: [u8; SALT_SIZE],
    },
}

impl KeySource {
    /// Wire tag for this key source.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::LinkOnly => 0x01,
            Self::Password { .. } => 0x02,
        }
    }

    /// Whether a password is required to derive the key.
    #[must_use]
    pub const fn requires_password(self) -> bool {
        matches!(self, Self::Password { .. })
    }
}

/// Self-describing ciphertext container.
///
/// # Security
///
/// The envelope commits to an algorithm before decryption, so a reader never
/// has to guess; an attacker flipping the algorithm tag merely produces an
/// authentication failure. No field leaks anything about the plaintext
/// beyond its approximate length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// AEAD construction that sealed the ciphertext.
    pub algorithm: Algorithm,
    /// How the key is derived at open time.
    pub key_source: KeySource,
    /// Nonce field; [`Algorithm::nonce_len`] bytes are significant.
    pub nonce: [u8; NONCE_SIZE],
    /// AEAD output: ciphertext followed by the 16-byte authentication tag.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Magic number: "SEAL" in ASCII.
    pub const MAGIC: u32 = 0x5345_414C;

    /// Current envelope version. Version 1 pins Argon2id(64 MiB, t=3, p=1)
    /// for password key derivation.
    pub const VERSION: u8 = 0x01;

    /// Maximum ciphertext size: 16 MiB of plaintext plus the tag.
    pub const MAX_CIPHERTEXT_SIZE: usize = 16 * 1024 * 1024 + TAG_SIZE;

    /// Fixed header length excluding the optional salt.
    const FIXED_LEN: usize = 4 + 1 + 1 + 1 + NONCE_SIZE;

    /// Serialized length of this envelope.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let salt = if self.key_source.requires_password() { SALT_SIZE } else { 0 };
        Self::FIXED_LEN + salt + self.ciphertext.len()
    }

    /// Encode the envelope into a buffer.
    ///
    /// # Errors
    ///
    /// - [`ProtoError::CiphertextTooLarge`] if the ciphertext exceeds
    ///   [`Envelope::MAX_CIPHERTEXT_SIZE`]
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        if self.ciphertext.len() > Self::MAX_CIPHERTEXT_SIZE {
            return Err(ProtoError::CiphertextTooLarge {
                size: self.ciphertext.len(),
                max: Self::MAX_CIPHERTEXT_SIZE,
            });
        }

        dst.put_u32(Self::MAGIC);
        dst.put_u8(Self::VERSION);
        dst.put_u8(self.algorithm.to_u8());
        dst.put_u8(self.key_source.to_u8());
        if let KeySource::Password { salt } = self.key_source {
            dst.put_slice(&salt);
        }
        dst.put_slice(&self.nonce);
        dst.put_slice(&self.ciphertext);

        Ok(())
    }

    /// Encode into a fresh `Vec`.
    ///
    /// # Errors
    ///
    /// Same as [`Envelope::encode`].
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode an envelope from bytes.
    ///
    /// All validation happens before the ciphertext is copied, so malformed
    /// headers are rejected without allocating for attacker-sized payloads.
    ///
    /// # Errors
    ///
    /// - [`ProtoError::Truncated`] if the buffer ends mid-header
    /// - [`ProtoError::InvalidMagic`] if the magic bytes are wrong
    /// - [`ProtoError::UnsupportedVersion`] for versions this build ignores
    /// - [`ProtoError::UnknownAlgorithm`] / [`ProtoError::UnknownKeySource`]
    ///   for unrecognized tags
    /// - [`ProtoError::CiphertextTooLarge`] past the 16 MiB limit
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::FIXED_LEN + TAG_SIZE {
            return Err(ProtoError::Truncated {
                needed: Self::FIXED_LEN + TAG_SIZE,
                got: bytes.len(),
            });
        }

        // INVARIANT: length checked above, slices below cannot panic.
        let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != Self::MAGIC {
            return Err(ProtoError::InvalidMagic(magic));
        }

        let version = bytes[4];
        if version != Self::VERSION {
            return Err(ProtoError::UnsupportedVersion(version));
        }

        let algorithm =
            Algorithm::from_u8(bytes[5]).ok_or(ProtoError::UnknownAlgorithm(bytes[5]))?;

        let (key_source, mut offset) = match bytes[6] {
            0x01 => (KeySource::LinkOnly, 7),
            0x02 => {
                let end = 7 + SALT_SIZE;
                if bytes.len() < end + NONCE_SIZE + TAG_SIZE {
                    return Err(ProtoError::Truncated {
                        needed: end + NONCE_SIZE + TAG_SIZE,
                        got: bytes.len(),
                    });
                }
                let mut salt = [0u8; SALT_SIZE];
                salt.copy_from_slice(&bytes[7..end]);
                (KeySource::Password { salt }, end)
            },
            other => return Err(ProtoError::UnknownKeySource(other)),
        };

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[offset..offset + NONCE_SIZE]);
        offset += NONCE_SIZE;

        let ciphertext_len = bytes.len() - offset;
        if ciphertext_len > Self::MAX_CIPHERTEXT_SIZE {
            return Err(ProtoError::CiphertextTooLarge {
                size: ciphertext_len,
                max: Self::MAX_CIPHERTEXT_SIZE,
            });
        }

        Ok(Self { algorithm, key_source, nonce, ciphertext: bytes[offset..].to_vec() })
    }
}
