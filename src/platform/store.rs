// LogIntel - platform/store.rs
//
// In-memory record store and the backend factory used at startup.

use crate::app::contracts::LogStore;
use crate::core::filter::RecordFilter;
use crate::core::model::{LogRecord, NewLogRecord};
use crate::platform::config::StorageBackend;
use crate::platform::sqlite::SqliteStore;
use crate::util::error::StoreError;
use std::sync::{Arc, RwLock};

/// Volatile store: a single `RwLock`-guarded vector. Identifiers start at 1
/// and are assigned under the write lock, so a batch is always contiguous.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<LogRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable {
        reason: "in-memory store lock poisoned".to_string(),
    }
}

impl LogStore for MemoryStore {
    fn insert_batch(&self, records: Vec<NewLogRecord>) -> Result<Vec<LogRecord>, StoreError> {
        let mut guard = self.records.write().map_err(poisoned)?;
        let first_id = guard.last().map_or(1, |r| r.id + 1);
        let stored: Vec<LogRecord> = records
            .into_iter()
            .zip(first_id..)
            .map(|(rec, id)| rec.with_id(id))
            .collect();
        guard.extend(stored.iter().cloned());
        Ok(stored)
    }

    fn find_all(&self) -> Result<Vec<LogRecord>, StoreError> {
        Ok(self.records.read().map_err(poisoned)?.clone())
    }

    fn find_filtered(&self, filter: &RecordFilter) -> Result<Vec<LogRecord>, StoreError> {
        let guard = self.records.read().map_err(poisoned)?;
        Ok(filter.apply(&guard).into_iter().cloned().collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().map_err(poisoned)?.len())
    }
}

/// Build the configured store backend.
pub fn open_store(backend: &StorageBackend) -> Result<Arc<dyn LogStore>, StoreError> {
    match backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory record store (records are lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Sqlite { path } => {
            let store = SqliteStore::open(path)?;
            tracing::info!(path = %path.display(), "Using SQLite record store");
            Ok(Arc::new(store))
        }
    }
}
