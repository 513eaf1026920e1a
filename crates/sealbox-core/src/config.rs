//! Service configuration and per-secret policy resolution.

use sealbox_proto::Algorithm;

use crate::model::ReadBudget;

/// Seconds in one day.
const DAY_SECS: u64 = 24 * 60 * 60;

/// Operator-level configuration for the submission service.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Size limit for the plaintext bundle (message plus file contents) in
    /// bytes. Submissions at or over the limit are rejected.
    pub max_secret_size: u64,
    /// Default lifetime for secrets that do not request one, in seconds.
    pub default_expires_in_secs: u64,
    /// Upper bound on any requested lifetime, in seconds.
    pub max_expires_in_secs: u64,
    /// Force burn-after-read: every secret gets a budget of exactly one
    /// read, whatever the sender asked for.
    pub require_burn: bool,
    /// AEAD construction for new secrets. Stored per envelope, so this can
    /// change without breaking existing secrets.
    pub algorithm: Algorithm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_secret_size: 1024 * 1024,
            default_expires_in_secs: 3 * DAY_SECS,
            max_expires_in_secs: 30 * DAY_SECS,
            require_burn: false,
            algorithm: Algorithm::XChaCha20Poly1305,
        }
    }
}

impl Config {
    /// Resolve a sender's requested policy against operator limits.
    ///
    /// - `require_burn` overrides the read budget to exactly one.
    /// - A missing lifetime takes the default; a requested one is clamped to
    ///   `max_expires_in_secs`.
    #[must_use]
    pub fn resolve(&self, requested: SecretPolicy) -> SecretPolicy {
        let reads =
            if self.require_burn { ReadBudget::Limited(1) } else { requested.reads };
        let expires_in_secs = requested
            .expires_in_secs
            .unwrap_or(self.default_expires_in_secs)
            .min(self.max_expires_in_secs);

        SecretPolicy {
            reads,
            slow_burn: requested.slow_burn,
            expires_in_secs: Some(expires_in_secs),
        }
    }
}

/// Per-secret lifecycle options chosen by the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretPolicy {
    /// How many successful reads the secret permits.
    pub reads: ReadBudget,
    /// Defer read consumption until a decryption succeeds.
    ///
    /// Trade-off: failed password attempts no longer burn reads, but an
    /// attacker with the link gains unlimited guesses.
    pub slow_burn: bool,
    /// Requested lifetime in seconds. `None` takes the operator default.
    pub expires_in_secs: Option<u64>,
}

impl Default for SecretPolicy {
    /// Burn-after-read, eager accounting, default lifetime.
    fn default() -> Self {
        Self { reads: ReadBudget::Limited(1), slow_burn: false, expires_in_secs: None }
    }
}
