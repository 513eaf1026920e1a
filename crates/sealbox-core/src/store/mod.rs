//! Store abstraction for secret records.
//!
//! Trait-based abstraction over persistence. The trait is synchronous (no
//! async) to keep the lifecycle logic a plain state machine; async callers
//! wrap it as needed.
//!
//! Atomicity is the whole point of this seam: `fetch` must apply the read
//! transition and hand out ciphertext in one indivisible step, so two
//! concurrent readers of a one-read secret can never both succeed. The
//! transition math itself lives on [`SecretRecord`](crate::SecretRecord)
//! (`begin_read`/`consume_read`); backends only have to run it inside their
//! own serializing primitive.

mod chaotic;
mod memory;

pub use chaotic::ChaoticStore;
pub use memory::MemoryStore;

use crate::{lifecycle::FetchedSecret, model::SecretId, model::SecretRecord};

/// Errors from a store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A record already exists under this id.
    #[error("id conflict")]
    Conflict,

    /// Underlying I/O failure.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend is temporarily unavailable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}

/// Storage abstraction for secret records.
///
/// Must be Clone (shared across services), Send + Sync (thread-safe), and
/// synchronous. Implementations typically share internal state via Arc, so
/// clones access the same underlying storage.
///
/// # Panics
///
/// Implementations may panic if internal synchronization primitives are
/// poisoned (a thread panicked while holding a lock). Acceptable for
/// test/simulation code.
pub trait SecretStore: Clone + Send + Sync + 'static {
    /// Persist a new record.
    ///
    /// # Invariants
    ///
    /// - Pre: no record exists under `record.id` (else [`StoreError::Conflict`])
    /// - Post: the record is durable before this returns
    fn insert(&self, record: &SecretRecord) -> Result<(), StoreError>;

    /// Atomically apply one read attempt at `now_secs`.
    ///
    /// Returns the ciphertext and metadata when the record is readable, or
    /// `None` when it is absent, expired, or depleted. Expired and depleted
    /// records encountered here are destroyed in the same step.
    ///
    /// For eager records this consumes a read and, at budget zero, destroys
    /// the record atomically with handing out the ciphertext. Slow-burn
    /// records are returned without consumption; see [`Self::confirm_read`].
    ///
    /// # Invariants
    ///
    /// - Two concurrent calls on a record with one remaining read yield the
    ///   ciphertext exactly once.
    fn fetch(&self, id: SecretId, now_secs: u64) -> Result<Option<FetchedSecret>, StoreError>;

    /// Consume one read of a slow-burn record after a successful decryption.
    ///
    /// Destroys the record when the budget reaches zero. A missing record
    /// (already destroyed, or a lost race) is a quiet no-op.
    fn confirm_read(&self, id: SecretId) -> Result<(), StoreError>;

    /// Destroy a record unconditionally. Returns whether one existed.
    fn remove(&self, id: SecretId) -> Result<bool, StoreError>;

    /// Destroy every record past its expiry at `now_secs`. Returns how many
    /// were destroyed.
    fn purge_expired(&self, now_secs: u64) -> Result<u64, StoreError>;

    /// Number of stored records, including expired ones not yet purged.
    fn count(&self) -> Result<u64, StoreError>;
}
