//! Chaotic store wrapper for fault injection testing
//!
//! Store wrapper that randomly fails operations to test error handling and
//! recovery. Used to verify that transient store failures never destroy a
//! secret or leak one past its budget.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{Arc, Mutex};

use super::{SecretStore, StoreError};
use crate::{
    lifecycle::FetchedSecret,
    model::{SecretId, SecretRecord},
};

/// Chaotic store wrapper that randomly injects failures
///
/// Delegates to an underlying store implementation but randomly fails
/// operations based on a configured failure rate. Injected failures happen
/// *before* delegation, so a failed operation leaves the underlying store
/// untouched. Uses Arc<Mutex<>> for the RNG state, making it Clone and
/// thread-safe.
#[derive(Clone)]
pub struct ChaoticStore<S: SecretStore> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    /// Operation counter for performance testing
    operation_count: Arc<Mutex<usize>>,
}

/// Simple deterministic RNG for chaos injection
///
/// Uses linear congruential generator (LCG) for fast, deterministic
/// randomness. This ensures chaos tests are reproducible with the same seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate next random value [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    /// Check if we should fail (returns true with probability = `failure_rate`)
    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<S: SecretStore> ChaoticStore<S> {
    /// Create a new chaotic store wrapper
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Underlying store (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of store operations attempted, including failed ones.
    pub fn operation_count(&self) -> usize {
        #[allow(clippy::expect_used)]
        *self.operation_count.lock().expect("operation_count mutex poisoned")
    }

    /// Increment operation counter
    fn increment_operation_count(&self) {
        #[allow(clippy::expect_used)]
        let mut count = self.operation_count.lock().expect("operation_count mutex poisoned");
        *count += 1;
    }

    /// Check if this operation should fail
    fn should_fail(&self) -> bool {
        #[allow(clippy::expect_used)]
        self.rng.lock().expect("ChaoticRng mutex poisoned").should_fail(self.failure_rate)
    }
}

impl<S: SecretStore> SecretStore for ChaoticStore<S> {
    fn insert(&self, record: &SecretRecord) -> Result<(), StoreError> {
        self.increment_operation_count();
        if self.should_fail() {
            return Err(StoreError::Io("chaotic failure injection".to_string()));
        }
        self.inner.insert(record)
    }

    fn fetch(
        &self,
        id: SecretId,
        now_secs: u64,
    ) -> Result<Option<FetchedSecret>, StoreError> {
        self.increment_operation_count();
        if self.should_fail() {
            return Err(StoreError::Io("chaotic failure injection".to_string()));
        }
        self.inner.fetch(id, now_secs)
    }

    fn confirm_read(&self, id: SecretId) -> Result<(), StoreError> {
        self.increment_operation_count();
        if self.should_fail() {
            return Err(StoreError::Io("chaotic failure injection".to_string()));
        }
        self.inner.confirm_read(id)
    }

    fn remove(&self, id: SecretId) -> Result<bool, StoreError> {
        self.increment_operation_count();
        if self.should_fail() {
            return Err(StoreError::Io("chaotic failure injection".to_string()));
        }
        self.inner.remove(id)
    }

    fn purge_expired(&self, now_secs: u64) -> Result<u64, StoreError> {
        self.increment_operation_count();
        if self.should_fail() {
            return Err(StoreError::Io("chaotic failure injection".to_string()));
        }
        self.inner.purge_expired(now_secs)
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.increment_operation_count();
        if self.should_fail() {
            return Err(StoreError::Io("chaotic failure injection".to_string()));
        }
        self.inner.count()
    }
}
