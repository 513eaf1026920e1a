//! Production Environment implementation using system time and RNG.
//!
//! # Capabilities
//!
//! - Real wall-clock time that advances naturally
//! - OS cryptographic RNG (getrandom). Truly random, not reproducible
//!
//! This means production behavior is non-deterministic, but provides
//! real-world timing and security-grade randomness.

use sealbox_core::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// # Security
///
/// The RNG uses getrandom which provides OS-level cryptographic randomness
/// (e.g., /dev/urandom on Linux, `BCryptGenRandom` on Windows). Suitable for
/// generating secret ids, link keys, salts, and nonces.
///
/// # Panics
///
/// Panics if the OS RNG fails. This is intentional - a service without
/// functioning cryptographic randomness cannot operate securely, and
/// continuing would compromise every link key and nonce it generates.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn now_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_secs()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - cannot operate securely");
    }
}
