//! Environment abstraction for deterministic testing.
//!
//! Decouples lifecycle logic from system resources (clock, randomness).
//! Production code plugs in a wall-clock/OS-entropy environment; tests use
//! [`ManualEnv`] with a hand-cranked clock and a seeded generator so expiry
//! and id-collision behavior is reproducible.

#![allow(clippy::disallowed_types, reason = "Locking simple clock/RNG state")]

use std::sync::{Arc, Mutex};

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now_secs()` never goes backwards within one execution context
/// - `random_bytes()` uses cryptographically secure entropy in production
///   (test environments may substitute a seeded generator)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time as unix seconds.
    ///
    /// Expiry is stored as an absolute unix timestamp, so this is wall time,
    /// not a monotonic instant.
    fn now_secs(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u128`, used for secret ids.
    fn random_u128(&self) -> u128 {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        u128::from_be_bytes(bytes)
    }
}

/// Deterministic test environment: manual clock, seeded generator.
///
/// The generator is a 64-bit LCG. NOT cryptographically secure; only for
/// tests, where reproducibility matters more than entropy.
#[derive(Clone)]
pub struct ManualEnv {
    inner: Arc<Mutex<ManualEnvInner>>,
}

struct ManualEnvInner {
    now_secs: u64,
    rng_state: u64,
}

impl ManualEnv {
    /// Create at time zero with the given generator seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { inner: Arc::new(Mutex::new(ManualEnvInner { now_secs: 0, rng_state: seed })) }
    }

    /// Create at a specific unix time with the given seed.
    #[must_use]
    pub fn at(now_secs: u64, seed: u64) -> Self {
        Self { inner: Arc::new(Mutex::new(ManualEnvInner { now_secs, rng_state: seed })) }
    }

    /// Move the clock forward.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    pub fn advance_secs(&self, secs: u64) {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        inner.now_secs = inner.now_secs.saturating_add(secs);
    }
}

impl ManualEnvInner {
    /// LCG step (constants from PCG). Returns the next 64-bit state.
    fn next_u64(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.rng_state
    }
}

impl Environment for ManualEnv {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn now_secs(&self) -> u64 {
        self.inner.lock().expect("Mutex poisoned").now_secs
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        for chunk in buffer.chunks_mut(8) {
            let bytes = inner.next_u64().to_be_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
