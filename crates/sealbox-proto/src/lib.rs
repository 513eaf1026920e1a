//! Sealbox wire formats.
//!
//! Two self-contained formats live here:
//!
//! - [`Payload`]: the plaintext bundle (message + file attachments),
//!   CBOR-encoded into a single blob so exactly one encrypt/decrypt cycle
//!   covers the whole secret.
//! - [`Envelope`]: the self-describing ciphertext container (algorithm tag,
//!   key source, salt, nonce, ciphertext). A recipient holding only the
//!   secret id and optional password can interpret it with no side channel.
//!
//! Neither format performs cryptography; see `sealbox-crypto` for sealing
//! and opening envelopes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
mod errors;
pub mod payload;

pub use envelope::{Algorithm, Envelope, KeySource, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
pub use errors::{ProtoError, Result};
pub use payload::{FileEntry, Payload};
