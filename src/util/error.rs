// LogIntel - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.
//
// Parse degradation is deliberately absent: a malformed line is an
// outcome of parsing (see core::parser::ParseOutcome), never an error.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level error type for all LogIntel operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogIntelError {
    /// Record storage failed.
    Store(StoreError),

    /// The external analysis engine call failed.
    Engine(EngineError),

    /// The HTTP server could not bind or stopped with an I/O error.
    Server { addr: String, source: io::Error },
}

impl fmt::Display for LogIntelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "Store error: {e}"),
            Self::Engine(e) => write!(f, "Analysis engine error: {e}"),
            Self::Server { addr, source } => write!(f, "Server error on '{addr}': {source}"),
        }
    }
}

impl std::error::Error for LogIntelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Engine(e) => Some(e),
            Self::Server { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors raised by a record store.
#[derive(Debug)]
pub enum StoreError {
    /// The store cannot serve requests (poisoned lock, closed connection).
    Unavailable { reason: String },

    /// A SQLite operation failed.
    Sqlite {
        operation: &'static str,
        source: rusqlite::Error,
    },

    /// The database file or its directory could not be prepared.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "store unavailable: {reason}"),
            Self::Sqlite { operation, source } => {
                write!(f, "SQLite {operation} failed: {source}")
            }
            Self::Io { path, source } => {
                write!(f, "store I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Unavailable { .. } => None,
        }
    }
}

impl From<StoreError> for LogIntelError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

/// Errors raised while delegating analysis to the external engine.
#[derive(Debug)]
pub enum EngineError {
    /// The engine could not be reached (connection refused, DNS, transport).
    Unavailable {
        endpoint: String,
        source: reqwest::Error,
    },

    /// The engine did not answer within the configured timeout.
    Timeout { endpoint: String, after: Duration },

    /// The engine answered with a non-success status.
    Status { endpoint: String, status: u16 },

    /// The engine answered with a body that is not an analysis result.
    MalformedResponse { endpoint: String, reason: String },

    /// The configured base URL is not usable.
    InvalidEndpoint { url: String, reason: String },
}

impl EngineError {
    /// Short machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "engine_unavailable",
            Self::Timeout { .. } => "engine_timeout",
            Self::Status { .. } => "engine_status",
            Self::MalformedResponse { .. } => "engine_malformed_response",
            Self::InvalidEndpoint { .. } => "engine_invalid_endpoint",
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { endpoint, source } => {
                write!(f, "engine at '{endpoint}' is unavailable: {source}")
            }
            Self::Timeout { endpoint, after } => write!(
                f,
                "engine at '{endpoint}' did not respond within {}s",
                after.as_secs_f64()
            ),
            Self::Status { endpoint, status } => {
                write!(f, "engine at '{endpoint}' returned HTTP {status}")
            }
            Self::MalformedResponse { endpoint, reason } => {
                write!(f, "engine at '{endpoint}' returned a malformed response: {reason}")
            }
            Self::InvalidEndpoint { url, reason } => {
                write!(f, "invalid engine URL '{url}': {reason}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<EngineError> for LogIntelError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

// ---------------------------------------------------------------------------
// Ingest errors
// ---------------------------------------------------------------------------

/// Errors from the ingestion orchestrator. Either the whole batch is
/// persisted or one of these is returned.
#[derive(Debug)]
pub enum IngestError {
    /// The batch exceeds the configured line limit; nothing was parsed.
    BatchTooLarge { count: usize, max: usize },

    /// The store rejected or failed the batch write.
    Store(StoreError),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatchTooLarge { count, max } => write!(
                f,
                "batch of {count} lines exceeds maximum of {max}. Split the upload into smaller batches."
            ),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::BatchTooLarge { .. } => None,
        }
    }
}

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Analysis errors
// ---------------------------------------------------------------------------

/// Errors from the analysis orchestrator. No partial result accompanies them.
#[derive(Debug)]
pub enum AnalysisError {
    /// The corpus could not be read.
    Store(StoreError),

    /// The engine call failed, timed out, or returned garbage.
    Engine(EngineError),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "{e}"),
            Self::Engine(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Engine(e) => Some(e),
        }
    }
}

impl From<StoreError> for AnalysisError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<EngineError> for AnalysisError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::ValueOutOfRange { .. } => None,
        }
    }
}

/// Convenience type alias for LogIntel results.
pub type Result<T> = std::result::Result<T, LogIntelError>;
