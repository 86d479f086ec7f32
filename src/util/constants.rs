// LogIntel - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogIntel";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogIntel";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Parsing
// =============================================================================

/// Service label applied when an ingest request omits one.
/// The effective value is configurable via `[ingest] default_service_name`.
pub const DEFAULT_SERVICE_NAME: &str = "default-service";

/// Level assigned to lines that could not be decomposed.
pub const UNKNOWN_LEVEL: &str = "UNKNOWN";

/// Width of the fixed timestamp prefix (`YYYY-MM-DD HH:MM:SS`).
pub const TIMESTAMP_PREFIX_LEN: usize = 19;

/// chrono format string for the timestamp prefix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Storage bounds (characters, not bytes)
// =============================================================================

/// Maximum stored length of a parsed message.
pub const MAX_MESSAGE_CHARS: usize = 2_000;

/// Maximum stored length of the original line.
pub const MAX_RAW_LINE_CHARS: usize = 4_000;

/// Maximum stored length of a level token.
pub const MAX_LEVEL_CHARS: usize = 255;

/// Maximum stored length of a service label.
pub const MAX_SERVICE_NAME_CHARS: usize = 255;

// =============================================================================
// Server
// =============================================================================

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default maximum request body size in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024; // 16 MiB

/// Smallest accepted body limit.
pub const MIN_MAX_BODY_BYTES: usize = 1024;

/// Hard upper bound on the body limit (prevents configuration mistakes).
pub const ABSOLUTE_MAX_BODY_BYTES: usize = 512 * 1024 * 1024; // 512 MiB

/// Default maximum number of lines accepted in one ingest batch.
pub const DEFAULT_MAX_BATCH_LINES: usize = 100_000;

/// Hard upper bound on lines per batch.
pub const ABSOLUTE_MAX_BATCH_LINES: usize = 5_000_000;

/// Browser origins allowed by default. `*` admits any origin.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["*"];

/// How long browsers may cache a preflight answer.
pub const CORS_MAX_AGE_SECS: u64 = 600;

// =============================================================================
// Analysis engine
// =============================================================================

/// Default base URL of the external analysis engine.
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8001";

/// Path of the engine's single operation, relative to the base URL.
pub const ENGINE_ANALYZE_PATH: &str = "/analyze";

/// Default timeout for one engine round-trip.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 30;

/// Minimum configurable engine timeout.
pub const MIN_ENGINE_TIMEOUT_SECS: u64 = 1;

/// Maximum configurable engine timeout.
pub const MAX_ENGINE_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
/// Prevents accidental exposure of sensitive data in long lines.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default SQLite database file name (stored in the platform data directory).
pub const DATABASE_FILE_NAME: &str = "logintel.db";
