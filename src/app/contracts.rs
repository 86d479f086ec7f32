// LogIntel - app/contracts.rs
//
// Collaborator contracts the orchestrators are written against. The
// platform layer supplies the real implementations (SQLite/in-memory
// stores, the HTTP engine client); tests supply fakes.

use crate::core::filter::RecordFilter;
use crate::core::model::{AnalysisResult, LogRecord, NewLogRecord};
use crate::util::error::{EngineError, StoreError};
use async_trait::async_trait;

/// Durable record storage.
///
/// Implementations own their locking: concurrent `insert_batch` and
/// `find_*` calls must be safe without coordination from the caller.
pub trait LogStore: Send + Sync {
    /// Persist a batch in one atomic write. Identifiers are assigned in
    /// input order and the returned records keep that order.
    fn insert_batch(&self, records: Vec<NewLogRecord>) -> Result<Vec<LogRecord>, StoreError>;

    /// Every stored record, in store order (ascending id).
    fn find_all(&self) -> Result<Vec<LogRecord>, StoreError>;

    /// Stored records matching `filter`, in store order.
    fn find_filtered(&self, filter: &RecordFilter) -> Result<Vec<LogRecord>, StoreError>;

    /// Number of stored records.
    fn count(&self) -> Result<usize, StoreError>;
}

/// The external clustering service. Opaque and stateless per call.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Location reported in logs and errors.
    fn endpoint(&self) -> &str;

    /// Send the corpus, return the engine's answer unchanged.
    async fn analyze(&self, logs: &[LogRecord]) -> Result<AnalysisResult, EngineError>;
}
