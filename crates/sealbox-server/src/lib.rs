//! Sealbox production glue.
//!
//! Wraps [`sealbox_core`]'s deterministic lifecycle logic with real I/O:
//! redb-backed durable storage, an environment using system time and
//! cryptographic RNG, and a background reaper that purges expired secrets.
//!
//! # Components
//!
//! - [`RedbStore`]: durable store, one write transaction per mutation
//! - [`SystemEnv`]: production environment (wall clock, OS RNG)
//! - [`Reaper`]: periodic expiry sweep

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod env;
mod reaper;
mod store;

pub use env::SystemEnv;
pub use reaper::Reaper;
pub use store::RedbStore;
