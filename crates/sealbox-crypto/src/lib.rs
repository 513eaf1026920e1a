//! Sealbox cryptographic engine.
//!
//! Pure functions with deterministic outputs. Callers provide all random
//! bytes (link keys, salts, nonces), which keeps the engine testable and
//! guarantees the store side never holds key material.
//!
//! # Key lifecycle
//!
//! ```text
//! Access-reference randomness ──────────────► Link Key
//!                                                │
//! Password ──► Argon2id(password, salt) ──┐      │
//!                                         ▼      ▼
//!                              HKDF-SHA256(prk, link key)
//!                                         │
//!                                         ▼
//!                              AEAD seal ──► Envelope
//! ```
//!
//! Without a password the link key is used directly; with one, the Argon2id
//! output and the link key are both required, so the password *additionally*
//! hardens the secret rather than replacing the link factor.
//!
//! # Security
//!
//! Zero knowledge:
//! - The link key travels only inside the access reference (URL fragment
//!   analogue); the store sees ciphertext, salt, and nonce, none of which
//!   suffice to decrypt.
//!
//! Anti-oracle:
//! - [`open`] reports a single unit [`CryptoError::DecryptionFailed`] for
//!   wrong password, tampering, and corruption alike.
//!
//! Algorithm agility:
//! - The envelope names its AEAD construction; [`open`] dispatches on the
//!   tag so retrieval code never guesses.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod aead;
mod error;
mod kdf;

pub use aead::{open, seal};
pub use error::CryptoError;
pub use kdf::{KEY_SIZE, SecretKey, derive_password_key};
