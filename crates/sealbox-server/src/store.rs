//! Redb-backed durable secret store.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. The
//! write transaction is the atomicity boundary for `fetch`: the read
//! transition and the record removal commit together or not at all, so a
//! crash mid-read never leaks an extra read.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use sealbox_core::{
    FetchedSecret, SecretId, SecretRecord, SecretStore, StoreError, model::ReadOutcome,
};

/// Table: secrets
/// Key: secret id as big-endian bytes [16 bytes]
/// Value: CBOR-encoded `SecretRecord`
const SECRETS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("secrets");

/// Durable secret store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the SECRETS table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(|e| StoreError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Load a record without applying a read transition.
    ///
    /// Local-admin escape hatch for inspection; the anti-oracle collapsing
    /// happens in the services, not here.
    pub fn peek(&self, id: SecretId) -> Result<Option<SecretRecord>, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;

        let key = encode_key(id);
        match table.get(key.as_slice()).map_err(|e| StoreError::Io(e.to_string()))? {
            Some(value) => {
                let record: SecretRecord = ciborium::from_reader(value.value())
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(record))
            },
            None => Ok(None),
        }
    }
}

impl SecretStore for RedbStore {
    fn insert(&self, record: &SecretRecord) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;

        {
            let mut table =
                txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;

            let key = encode_key(record.id);

            if table.get(key.as_slice()).map_err(|e| StoreError::Io(e.to_string()))?.is_some()
            {
                return Err(StoreError::Conflict);
            }

            let mut bytes = Vec::new();
            ciborium::into_writer(record, &mut bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;

            table
                .insert(key.as_slice(), bytes.as_slice())
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }

        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    fn fetch(
        &self,
        id: SecretId,
        now_secs: u64,
    ) -> Result<Option<FetchedSecret>, StoreError> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;

        let fetched = {
            let mut table =
                txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;

            let key = encode_key(id);

            let record: Option<SecretRecord> =
                match table.get(key.as_slice()).map_err(|e| StoreError::Io(e.to_string()))? {
                    Some(value) => Some(
                        ciborium::from_reader(value.value())
                            .map_err(|e| StoreError::Serialization(e.to_string()))?,
                    ),
                    None => None,
                };
            let Some(mut record) = record else {
                // Transaction dropped without commit; nothing changed.
                return Ok(None);
            };

            match record.begin_read(now_secs) {
                ReadOutcome::Expired | ReadOutcome::Depleted => {
                    table
                        .remove(key.as_slice())
                        .map_err(|e| StoreError::Io(e.to_string()))?;
                    None
                },
                ReadOutcome::Yield { destroy } => {
                    let fetched = FetchedSecret::from_record(&record);

                    if destroy {
                        table
                            .remove(key.as_slice())
                            .map_err(|e| StoreError::Io(e.to_string()))?;
                    } else if !record.slow_burn {
                        // Eager read: persist the decremented budget.
                        let mut bytes = Vec::new();
                        ciborium::into_writer(&record, &mut bytes)
                            .map_err(|e| StoreError::Serialization(e.to_string()))?;
                        table
                            .insert(key.as_slice(), bytes.as_slice())
                            .map_err(|e| StoreError::Io(e.to_string()))?;
                    }

                    Some(fetched)
                },
            }
        };

        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(fetched)
    }

    fn confirm_read(&self, id: SecretId) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;

        {
            let mut table =
                txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;

            let key = encode_key(id);

            let record: Option<SecretRecord> =
                match table.get(key.as_slice()).map_err(|e| StoreError::Io(e.to_string()))? {
                    Some(value) => Some(
                        ciborium::from_reader(value.value())
                            .map_err(|e| StoreError::Serialization(e.to_string()))?,
                    ),
                    None => None,
                };
            let Some(mut record) = record else {
                // Already destroyed; a lost confirm race is a quiet no-op.
                return Ok(());
            };

            if record.consume_read() {
                table.remove(key.as_slice()).map_err(|e| StoreError::Io(e.to_string()))?;
            } else {
                let mut bytes = Vec::new();
                ciborium::into_writer(&record, &mut bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                table
                    .insert(key.as_slice(), bytes.as_slice())
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    fn remove(&self, id: SecretId) -> Result<bool, StoreError> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;

        let existed = {
            let mut table =
                txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;

            let key = encode_key(id);
            table.remove(key.as_slice()).map_err(|e| StoreError::Io(e.to_string()))?.is_some()
        };

        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(existed)
    }

    fn purge_expired(&self, now_secs: u64) -> Result<u64, StoreError> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;

        let purged = {
            let mut table =
                txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;

            let mut expired_keys: Vec<[u8; 16]> = Vec::new();
            for result in table.iter().map_err(|e| StoreError::Io(e.to_string()))? {
                let (key, value) = result.map_err(|e| StoreError::Io(e.to_string()))?;
                let record: SecretRecord = ciborium::from_reader(value.value())
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;

                if record.is_expired(now_secs) {
                    let mut raw = [0u8; 16];
                    raw.copy_from_slice(key.value());
                    expired_keys.push(raw);
                }
            }

            for key in &expired_keys {
                table.remove(key.as_slice()).map_err(|e| StoreError::Io(e.to_string()))?;
            }

            expired_keys.len() as u64
        };

        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(purged)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;

        table.len().map_err(|e| StoreError::Io(e.to_string()))
    }
}

/// Encode a secret id as a 16-byte big-endian key.
fn encode_key(id: SecretId) -> [u8; 16] {
    id.as_u128().to_be_bytes()
}
