// LogIntel - platform/sqlite.rs
//
// Durable record store on SQLite. One connection behind a mutex; each
// batch is written inside a single transaction so a failed batch leaves
// no rows behind.

use crate::app::contracts::LogStore;
use crate::core::filter::RecordFilter;
use crate::core::model::{LogRecord, NewLogRecord};
use crate::util::error::StoreError;
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Timestamps are stored as ISO-8601 text without offset.
const TIMESTAMP_STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS log_entries (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp    TEXT NOT NULL,
    level        VARCHAR(255) NOT NULL,
    service_name VARCHAR(255) NOT NULL,
    message      VARCHAR(2000) NOT NULL,
    raw_line     VARCHAR(4000) NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_log_entries_level ON log_entries(level COLLATE NOCASE);
";

const SELECT_COLUMNS: &str =
    "SELECT id, timestamp, level, service_name, message, raw_line FROM log_entries";

fn sqlite_err(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |source| StoreError::Sqlite { operation, source }
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(sqlite_err("open"))?;
        Self::init(conn, &path.display().to_string())
    }

    /// Private, process-local database. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(sqlite_err("open"))?;
        Self::init(conn, ":memory:")
    }

    fn init(conn: Connection, location: &str) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(sqlite_err("schema migration"))?;
        tracing::debug!(path = %location, "SQLite schema ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Unavailable {
            reason: "SQLite connection lock poisoned".to_string(),
        })
    }

    fn query(&self, sql: &str, values: Vec<String>) -> Result<Vec<LogRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(sql).map_err(sqlite_err("prepare select"))?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), row_to_record)
            .map_err(sqlite_err("select"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(sqlite_err("read row"))
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<LogRecord> {
    let id: i64 = row.get(0)?;
    let raw_ts: String = row.get(1)?;
    let timestamp = NaiveDateTime::parse_from_str(&raw_ts, TIMESTAMP_STORAGE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(LogRecord {
        id: id as u64,
        timestamp,
        level: row.get(2)?,
        service_name: row.get(3)?,
        message: row.get(4)?,
        raw_line: row.get(5)?,
    })
}

impl LogStore for SqliteStore {
    fn insert_batch(&self, records: Vec<NewLogRecord>) -> Result<Vec<LogRecord>, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sqlite_err("begin transaction"))?;
        let mut stored = Vec::with_capacity(records.len());
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO log_entries (timestamp, level, service_name, message, raw_line) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(sqlite_err("prepare insert"))?;
            for rec in records {
                stmt.execute(params![
                    rec.timestamp.format(TIMESTAMP_STORAGE_FORMAT).to_string(),
                    rec.level,
                    rec.service_name,
                    rec.message,
                    rec.raw_line,
                ])
                .map_err(sqlite_err("insert"))?;
                let id = tx.last_insert_rowid();
                stored.push(rec.with_id(id as u64));
            }
        }
        tx.commit().map_err(sqlite_err("commit"))?;
        Ok(stored)
    }

    fn find_all(&self) -> Result<Vec<LogRecord>, StoreError> {
        self.query(&format!("{SELECT_COLUMNS} ORDER BY id"), Vec::new())
    }

    fn find_filtered(&self, filter: &RecordFilter) -> Result<Vec<LogRecord>, StoreError> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(level) = filter.level() {
            values.push(level.to_string());
            clauses.push(format!("level = ?{} COLLATE NOCASE", values.len()));
        }
        if let Some(service) = filter.service() {
            values.push(service.to_string());
            clauses.push(format!("service_name = ?{}", values.len()));
        }
        let sql = if clauses.is_empty() {
            format!("{SELECT_COLUMNS} ORDER BY id")
        } else {
            format!("{SELECT_COLUMNS} WHERE {} ORDER BY id", clauses.join(" AND "))
        };
        self.query(&sql, values)
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM log_entries", [], |row| row.get(0))
            .map_err(sqlite_err("count"))?;
        Ok(n as usize)
    }
}
