// LogIntel - app/ingest.rs
//
// Ingestion orchestration: resolve the service label, normalise every
// line, persist the batch with one store write.
//
// Guarantees:
//   - Lossless at line level: output length and order equal the input's.
//   - All-or-nothing: a rejected or failed batch persists nothing.

use crate::app::contracts::LogStore;
use crate::core::filter::RecordFilter;
use crate::core::model::{IngestRequest, LogRecord, NewLogRecord};
use crate::core::parser::{self, ParseOutcome};
use crate::util::error::{IngestError, StoreError};
use chrono::Local;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Batches at or above this size are parsed on the rayon pool.
/// `collect` on an indexed parallel iterator keeps input order.
const PARALLEL_PARSE_THRESHOLD: usize = 1_024;

/// Ingestion orchestrator.
pub struct IngestService {
    store: Arc<dyn LogStore>,
    default_service: String,
    max_batch_lines: usize,
}

impl IngestService {
    pub fn new(
        store: Arc<dyn LogStore>,
        default_service: impl Into<String>,
        max_batch_lines: usize,
    ) -> Self {
        Self {
            store,
            default_service: default_service.into(),
            max_batch_lines,
        }
    }

    /// The caller's label if it has visible content, else the configured default.
    pub fn resolve_service<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested {
            Some(s) if !s.trim().is_empty() => s,
            _ => &self.default_service,
        }
    }

    /// Parse and persist a batch.
    pub fn ingest(&self, request: &IngestRequest) -> Result<Vec<LogRecord>, IngestError> {
        let count = request.lines.len();
        if count > self.max_batch_lines {
            tracing::warn!(
                lines = count,
                max = self.max_batch_lines,
                "Ingest batch rejected: too many lines"
            );
            return Err(IngestError::BatchTooLarge {
                count,
                max: self.max_batch_lines,
            });
        }

        let started = Instant::now();
        let service = self.resolve_service(request.service_name.as_deref());
        let outcomes = parse_batch(&request.lines, service);
        let degraded = outcomes.iter().filter(|o| o.is_degraded()).count();
        let records: Vec<NewLogRecord> =
            outcomes.into_iter().map(ParseOutcome::into_record).collect();

        let stored = self.store.insert_batch(records).map_err(|e| {
            tracing::error!(error = %e, lines = count, service, "Ingest batch failed to persist");
            IngestError::Store(e)
        })?;
        debug_assert_eq!(stored.len(), count, "store must return one record per line");

        tracing::info!(
            lines = count,
            structured = count - degraded,
            degraded,
            service,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingested batch"
        );

        Ok(stored)
    }

    /// Every stored record, in store order.
    pub fn get_all(&self) -> Result<Vec<LogRecord>, StoreError> {
        self.store.find_all()
    }

    /// Stored records matching `filter`. An empty filter is `get_all`.
    pub fn find(&self, filter: &RecordFilter) -> Result<Vec<LogRecord>, StoreError> {
        if filter.is_empty() {
            self.store.find_all()
        } else {
            self.store.find_filtered(filter)
        }
    }
}

/// Normalise every line, keeping input order.
fn parse_batch(lines: &[String], service: &str) -> Vec<ParseOutcome> {
    let parse = |line: &String| {
        parser::parse_line_outcome(line, service, || Local::now().naive_local())
    };
    if lines.len() >= PARALLEL_PARSE_THRESHOLD {
        lines.par_iter().map(parse).collect()
    } else {
        lines.iter().map(parse).collect()
    }
}
