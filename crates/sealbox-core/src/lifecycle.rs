//! Secret lifecycle: creation, atomic read accounting, destruction.
//!
//! [`Lifecycle`] is the policy-free middle layer: it binds an
//! [`Environment`] (ids, clock) to a [`SecretStore`] and translates store
//! outcomes into the collapsed error taxonomy. Size limits and key handling
//! live above it in the services.

use tracing::{debug, warn};

use crate::{
    env::Environment,
    error::SecretError,
    model::{ReadBudget, SecretId, SecretRecord},
    store::{SecretStore, StoreError},
};

/// Id generation retries before giving up. A collision in a 128-bit space
/// means a broken RNG, not bad luck.
const MAX_ID_ATTEMPTS: usize = 3;

/// Result of an atomic fetch: ciphertext plus the metadata a retriever needs.
///
/// For eager secrets `remaining_reads` is the count *after* this read; for
/// slow-burn secrets it is the unconsumed count (confirmation comes later).
/// `-1` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSecret {
    /// Encoded wire envelope.
    pub envelope: Vec<u8>,
    /// Signed remaining read count; `-1` means unlimited.
    pub remaining_reads: i64,
    /// Whether read consumption is deferred to a confirmation.
    pub slow_burn: bool,
    /// Whether opening requires a password in addition to the link key.
    pub password_protected: bool,
}

impl FetchedSecret {
    /// Snapshot the fetch result from a record, after its read transition
    /// has been applied.
    ///
    /// Store backends call this inside their critical section.
    #[must_use]
    pub fn from_record(record: &SecretRecord) -> Self {
        Self {
            envelope: record.envelope.clone(),
            remaining_reads: record.reads.as_i64(),
            slow_burn: record.slow_burn,
            password_protected: record.password_protected,
        }
    }
}

/// Lifecycle manager over a store and an environment.
#[derive(Clone)]
pub struct Lifecycle<S: SecretStore, E: Environment> {
    store: S,
    env: E,
}

impl<S: SecretStore, E: Environment> Lifecycle<S, E> {
    /// Bind a store and an environment.
    pub fn new(store: S, env: E) -> Self {
        Self { store, env }
    }

    /// The environment (for services that need randomness).
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist a sealed envelope under a fresh random id.
    ///
    /// `expires_in_secs` is relative to now; the stored expiry is absolute.
    pub fn create(
        &self,
        envelope: Vec<u8>,
        reads: ReadBudget,
        slow_burn: bool,
        expires_in_secs: u64,
        password_protected: bool,
    ) -> Result<SecretId, SecretError> {
        let now = self.env.now_secs();
        let mut record = SecretRecord {
            id: SecretId::new(0),
            envelope,
            created_at_secs: now,
            expires_at_secs: now.saturating_add(expires_in_secs),
            reads,
            slow_burn,
            password_protected,
        };

        for _ in 0..MAX_ID_ATTEMPTS {
            record.id = SecretId::new(self.env.random_u128());

            match self.store.insert(&record) {
                Ok(()) => {
                    debug!(
                        id = %record.id,
                        reads = %record.reads,
                        slow_burn,
                        expires_at_secs = record.expires_at_secs,
                        "secret created"
                    );
                    return Ok(record.id);
                },
                Err(StoreError::Conflict) => {
                    warn!(id = %record.id, "secret id collision, regenerating");
                },
                Err(error) => return Err(error.into()),
            }
        }

        Err(SecretError::Internal("exhausted secret id generation attempts".to_string()))
    }

    /// Atomically apply one read attempt.
    ///
    /// Absent, expired, and depleted all collapse to
    /// [`SecretError::SecretNotFound`]; store failures pass through.
    pub fn fetch(&self, id: SecretId) -> Result<FetchedSecret, SecretError> {
        let now = self.env.now_secs();

        match self.store.fetch(id, now)? {
            Some(fetched) => {
                debug!(%id, remaining_reads = fetched.remaining_reads, "secret fetched");
                Ok(fetched)
            },
            None => Err(SecretError::SecretNotFound),
        }
    }

    /// Consume a slow-burn read after a successful decryption.
    ///
    /// A record destroyed between fetch and confirm is a quiet no-op.
    pub fn confirm(&self, id: SecretId) -> Result<(), SecretError> {
        self.store.confirm_read(id)?;
        debug!(%id, "slow-burn read confirmed");
        Ok(())
    }

    /// Destroy a secret unconditionally. Returns whether one existed.
    pub fn destroy(&self, id: SecretId) -> Result<bool, SecretError> {
        let existed = self.store.remove(id)?;
        debug!(%id, existed, "secret destroyed");
        Ok(existed)
    }

    /// Destroy every expired record. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<u64, SecretError> {
        let purged = self.store.purge_expired(self.env.now_secs())?;
        if purged > 0 {
            debug!(purged, "expired secrets purged");
        }
        Ok(purged)
    }
}
