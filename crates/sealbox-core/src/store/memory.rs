#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{SecretStore, StoreError};
use crate::{
    lifecycle::FetchedSecret,
    model::{ReadOutcome, SecretId, SecretRecord},
};

/// In-memory store implementation for testing and simulation
///
/// Uses a `HashMap` wrapped in Arc<Mutex<>> to allow Clone and concurrent
/// access. The mutex doubles as the atomicity boundary for `fetch`: the read
/// transition and the record removal happen under one lock acquisition.
/// Thread-safe, but uses `lock().expect()` which will panic if the mutex is
/// poisoned - acceptable for test code.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<SecretId, SecretRecord>>>,
}

impl MemoryStore {
    /// Create a new empty `MemoryStore`
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Snapshot of a record's metadata, without applying a read.
    ///
    /// Test-only escape hatch for asserting on internal state.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned (a thread panicked while
    /// holding the lock). This is acceptable for test code.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn peek(&self, id: SecretId) -> Option<SecretRecord> {
        self.inner.lock().expect("Mutex poisoned").get(&id).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for MemoryStore {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn insert(&self, record: &SecretRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        if inner.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        inner.insert(record.id, record.clone());

        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn fetch(
        &self,
        id: SecretId,
        now_secs: u64,
    ) -> Result<Option<FetchedSecret>, StoreError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let Some(record) = inner.get_mut(&id) else {
            return Ok(None);
        };

        match record.begin_read(now_secs) {
            ReadOutcome::Expired | ReadOutcome::Depleted => {
                inner.remove(&id);
                Ok(None)
            },
            ReadOutcome::Yield { destroy } => {
                let fetched = FetchedSecret::from_record(record);
                if destroy {
                    inner.remove(&id);
                }
                Ok(Some(fetched))
            },
        }
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn confirm_read(&self, id: SecretId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let Some(record) = inner.get_mut(&id) else {
            return Ok(());
        };
        if record.consume_read() {
            inner.remove(&id);
        }

        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn remove(&self, id: SecretId) -> Result<bool, StoreError> {
        Ok(self.inner.lock().expect("Mutex poisoned").remove(&id).is_some())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn purge_expired(&self, now_secs: u64) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let before = inner.len();
        inner.retain(|_, record| !record.is_expired(now_secs));

        Ok((before - inner.len()) as u64)
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().expect("Mutex poisoned").len() as u64)
    }
}
