//! Core data model: identifiers, read budgets, and stored records.
//!
//! The read-accounting state machine lives on [`SecretRecord`] so that every
//! store backend applies identical transitions inside its own serializing
//! primitive (a mutex critical section, a write transaction).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Opaque 128-bit secret identifier.
///
/// Ids are generated from the environment's CSPRNG at submission time and
/// rendered as 32 lowercase hex characters. They carry no key material: an
/// id alone cannot decrypt anything.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SecretId(u128);

impl SecretId {
    /// Wrap a raw 128-bit value.
    #[must_use]
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw 128-bit value (for store key encoding).
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for SecretId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(ParseIdError);
        }
        u128::from_str_radix(s, 16).map(Self).map_err(|_| ParseIdError)
    }
}

/// A secret id string was not 32 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("secret id must be 32 hex characters")]
pub struct ParseIdError;

/// How many successful retrievals a secret permits.
///
/// The stored value is a *remaining* count: `Limited(0)` means depleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadBudget {
    /// No read limit; the secret lives until its expiry.
    Unlimited,
    /// At most this many reads remain.
    Limited(u32),
}

impl ReadBudget {
    /// Whether no limit applies.
    #[must_use]
    pub const fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Signed remaining count for display: `-1` means unlimited.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Unlimited => -1,
            Self::Limited(n) => n as i64, // u32 always fits
        }
    }
}

impl fmt::Display for ReadBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Limited(n) => write!(f, "{n}"),
        }
    }
}

/// Result of attempting to read a secret, computed by
/// [`SecretRecord::begin_read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Past expiry. The store must destroy the record.
    Expired,
    /// Read budget already at zero. The store must destroy the record.
    Depleted,
    /// The ciphertext may be handed out. When `destroy` is set the budget
    /// just reached zero and the record must be removed in the same critical
    /// section.
    Yield {
        /// Remove the record atomically with this read.
        destroy: bool,
    },
}

/// A stored secret: ciphertext envelope plus lifecycle metadata.
///
/// The envelope bytes are opaque to the store; all key material lives with
/// the sender's reference. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Identifier under which the record is stored.
    pub id: SecretId,
    /// Encoded wire envelope (see `sealbox_proto::Envelope`).
    pub envelope: Vec<u8>,
    /// Creation time, unix seconds.
    pub created_at_secs: u64,
    /// Absolute expiry, unix seconds. The record is unreadable at and after
    /// this instant.
    pub expires_at_secs: u64,
    /// Remaining read budget.
    pub reads: ReadBudget,
    /// Defer read consumption until a decryption is confirmed.
    pub slow_burn: bool,
    /// Whether opening requires a password in addition to the link key.
    pub password_protected: bool,
}

impl SecretRecord {
    /// Whether the record is past its expiry at `now_secs`.
    #[must_use]
    pub const fn is_expired(&self, now_secs: u64) -> bool {
        now_secs >= self.expires_at_secs
    }

    /// Whether the read budget is exhausted.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        matches!(self.reads, ReadBudget::Limited(0))
    }

    /// Whether a read at `now_secs` would yield ciphertext.
    #[must_use]
    pub const fn is_readable(&self, now_secs: u64) -> bool {
        !self.is_expired(now_secs) && !self.is_depleted()
    }

    /// Apply one read attempt at `now_secs`.
    ///
    /// Eager records consume a read immediately (a wrong password still burns
    /// the attempt). Slow-burn records yield without consuming; the store's
    /// `confirm_read` applies [`Self::consume_read`] later.
    ///
    /// # Invariants
    ///
    /// - Expiry dominates: an expired record never yields, whatever its
    ///   budget.
    /// - Must be called inside the store's critical section for this record.
    pub fn begin_read(&mut self, now_secs: u64) -> ReadOutcome {
        if self.is_expired(now_secs) {
            return ReadOutcome::Expired;
        }
        if self.is_depleted() {
            return ReadOutcome::Depleted;
        }
        if self.slow_burn {
            return ReadOutcome::Yield { destroy: false };
        }
        ReadOutcome::Yield { destroy: self.consume_read() }
    }

    /// Decrement the read budget by one. Returns `true` when the budget just
    /// reached zero and the record must be destroyed.
    ///
    /// A record already at zero stays at zero (a lost confirm race is a
    /// quiet no-op). Unlimited budgets never deplete.
    pub fn consume_read(&mut self) -> bool {
        match self.reads {
            ReadBudget::Unlimited | ReadBudget::Limited(0) => false,
            ReadBudget::Limited(n) => {
                self.reads = ReadBudget::Limited(n - 1);
                n == 1
            },
        }
    }
}
