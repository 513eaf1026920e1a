//! Sealbox core: the secret lifecycle state machine and its services.
//!
//! # Architecture
//!
//! ```text
//! SubmissionService ──► pack ──► seal ──► Lifecycle::create ──► SecretStore
//! RetrievalService  ──► Lifecycle::fetch ──► open ──► confirm ──► unpack
//! ```
//!
//! The [`SecretStore`] trait is the only persistence seam; everything above
//! it is deterministic given an [`Environment`]. Read accounting lives in
//! [`SecretRecord`] so every store backend applies identical transitions
//! inside its own serializing primitive.
//!
//! # Security
//!
//! Zero knowledge:
//! - Stores hold ciphertext envelopes and coarse lifecycle metadata only;
//!   key material exists solely in [`SecretReference`] values returned to
//!   the sender.
//!
//! Anti-oracle:
//! - Absent, expired, exhausted, and destroyed secrets all surface as
//!   [`SecretError::SecretNotFound`]; wrong password and corruption both
//!   surface as [`SecretError::DecryptionFailed`].
//!
//! Read accounting:
//! - Eager secrets consume their read when the ciphertext is fetched, so a
//!   wrong password still burns the attempt (no infinite guessing).
//! - Slow-burn secrets defer consumption until a decryption succeeds, at
//!   the price of unlimited password retries.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
mod error;
pub mod lifecycle;
pub mod model;
pub mod service;
pub mod store;

pub use config::{Config, SecretPolicy};
pub use env::{Environment, ManualEnv};
pub use error::SecretError;
pub use lifecycle::{FetchedSecret, Lifecycle};
pub use model::{ReadBudget, SecretId, SecretRecord};
pub use service::{RetrievalService, SecretReference, SubmissionService, decrypt_secret};
pub use store::{ChaoticStore, MemoryStore, SecretStore, StoreError};
