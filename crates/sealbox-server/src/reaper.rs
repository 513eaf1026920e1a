//! Background reaper: periodic sweep of expired secrets.
//!
//! Expired secrets are already unreadable (expiry is checked on every
//! fetch); the reaper exists so their ciphertext doesn't sit on disk until
//! someone happens to ask for it.

use std::time::Duration;

use sealbox_core::{Environment, Lifecycle, SecretError, SecretStore};
use tracing::{info, warn};

/// Periodic expiry sweep over a lifecycle manager.
pub struct Reaper<S: SecretStore, E: Environment> {
    lifecycle: Lifecycle<S, E>,
    interval: Duration,
}

impl<S: SecretStore, E: Environment> Reaper<S, E> {
    /// Build a reaper sweeping at the given interval.
    pub fn new(lifecycle: Lifecycle<S, E>, interval: Duration) -> Self {
        Self { lifecycle, interval }
    }

    /// One sweep. Returns how many secrets were destroyed.
    pub fn run_once(&self) -> Result<u64, SecretError> {
        let purged = self.lifecycle.purge_expired()?;
        if purged > 0 {
            info!(purged, "reaper destroyed expired secrets");
        }
        Ok(purged)
    }

    /// Sweep forever at the configured interval.
    ///
    /// A failed sweep is logged and retried next tick; transient store
    /// errors must not kill the loop.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(error) = self.run_once() {
                warn!(%error, "reaper sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sealbox_core::{ManualEnv, MemoryStore, ReadBudget};

    use super::*;

    #[test]
    fn run_once_purges_only_expired() {
        let env = ManualEnv::at(1_000, 3);
        let lifecycle = Lifecycle::new(MemoryStore::new(), env.clone());

        lifecycle.create(vec![1], ReadBudget::Unlimited, false, 50, false).unwrap();
        lifecycle.create(vec![2], ReadBudget::Unlimited, false, 5_000, false).unwrap();

        let reaper = Reaper::new(lifecycle.clone(), Duration::from_secs(60));

        assert_eq!(reaper.run_once().unwrap(), 0);

        env.advance_secs(100);
        assert_eq!(reaper.run_once().unwrap(), 1);
        assert_eq!(reaper.run_once().unwrap(), 0);
        assert_eq!(lifecycle.store().count().unwrap(), 1);
    }
}
