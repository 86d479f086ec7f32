// LogIntel - platform/config.rs
//
// Platform directory resolution and config.toml loading with startup
// validation. Invalid values never abort startup: they produce a warning
// and the default is used instead.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::platform::engine;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for LogIntel configuration and data.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logintel/ or %APPDATA%\LogIntel\config\)
    pub config_dir: PathBuf,

    /// Data directory; holds the SQLite database by default.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
                data_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }

    /// Default location of the SQLite database.
    pub fn database_file(&self) -> PathBuf {
        self.data_dir.join(constants::DATABASE_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file can be used
/// with an older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub server: ServerSection,
    pub ingest: IngestSection,
    pub engine: EngineSection,
    pub storage: StorageSection,
    pub logging: LoggingSection,
}

/// `[server]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Listen address, `host:port`.
    pub bind: Option<String>,
    /// Maximum request body size in bytes.
    pub max_body_bytes: Option<usize>,
    /// Maximum lines per ingest batch.
    pub max_batch_lines: Option<usize>,
    /// Browser origins allowed to call the API. `["*"]` = any, `[]` = none.
    pub cors_origins: Option<Vec<String>>,
}

/// `[ingest]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Label applied when a request omits `serviceName`.
    pub default_service_name: Option<String>,
}

/// `[engine]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Base URL; `/analyze` is appended.
    pub base_url: Option<String>,
    /// Round-trip timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// `[storage]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// "memory" or "sqlite".
    pub backend: Option<String>,
    /// SQLite database path (default: platform data dir).
    pub path: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Where records are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Volatile, process-local.
    Memory,
    /// SQLite database file.
    Sqlite { path: PathBuf },
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Server --
    pub bind_addr: String,
    pub max_body_bytes: usize,
    pub max_batch_lines: usize,
    /// Normalised browser origins; `*` admits any. Empty disables CORS.
    pub cors_origins: Vec<String>,

    // -- Ingest --
    pub default_service_name: String,

    // -- Engine --
    pub engine_url: String,
    pub engine_timeout_secs: u64,

    // -- Storage --
    pub storage: StorageBackend,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: constants::DEFAULT_BIND_ADDR.to_string(),
            max_body_bytes: constants::DEFAULT_MAX_BODY_BYTES,
            max_batch_lines: constants::DEFAULT_MAX_BATCH_LINES,
            cors_origins: constants::DEFAULT_CORS_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
            default_service_name: constants::DEFAULT_SERVICE_NAME.to_string(),
            engine_url: constants::DEFAULT_ENGINE_URL.to_string(),
            engine_timeout_secs: constants::DEFAULT_ENGINE_TIMEOUT_SECS,
            storage: StorageBackend::Memory,
            log_level: None,
        }
    }
}

fn read_raw(config_path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
        path: config_path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source,
    })
}

/// `host:port` with a numeric port. Hostnames are resolved at bind time.
fn is_host_port(s: &str) -> bool {
    if s.parse::<std::net::SocketAddr>().is_ok() {
        return true;
    }
    match s.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains(|c: char| c.is_whitespace() || c == '/')
                && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

/// Reduce a configured origin to the form browsers send in `Origin`.
fn normalise_origin(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed == "*" {
        return Some("*".to_string());
    }
    let url = reqwest::Url::parse(trimmed).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => {
            Some(url.origin().ascii_serialization())
        }
        _ => None,
    }
}

fn out_of_range(field: &str, value: impl ToString, expected: String) -> String {
    ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    }
    .to_string()
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal
/// warnings. A missing file yields defaults with no warnings (first run);
/// an unreadable or unparseable file yields defaults with one warning.
/// `default_db` is used when `[storage] backend = "sqlite"` names no path.
pub fn load_config(config_path: &Path, default_db: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let raw = match read_raw(config_path) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let config = validate(raw, default_db, &mut warnings);

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    (config, warnings)
}

/// Validate each field against named constants, accumulating all problems.
pub fn validate(raw: RawConfig, default_db: &Path, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Server: bind --
    if let Some(bind) = raw.server.bind {
        if is_host_port(&bind) {
            config.bind_addr = bind;
        } else {
            warnings.push(format!(
                "{}. Using default ({}).",
                out_of_range(
                    "server.bind",
                    &bind,
                    "host:port, e.g. 127.0.0.1:8080 or localhost:8080".to_string(),
                ),
                constants::DEFAULT_BIND_ADDR,
            ));
        }
    }

    // -- Server: max_body_bytes --
    if let Some(bytes) = raw.server.max_body_bytes {
        if (constants::MIN_MAX_BODY_BYTES..=constants::ABSOLUTE_MAX_BODY_BYTES).contains(&bytes) {
            config.max_body_bytes = bytes;
        } else {
            warnings.push(format!(
                "{}. Using default ({}).",
                out_of_range(
                    "server.max_body_bytes",
                    bytes,
                    format!(
                        "{}-{}",
                        constants::MIN_MAX_BODY_BYTES,
                        constants::ABSOLUTE_MAX_BODY_BYTES
                    ),
                ),
                constants::DEFAULT_MAX_BODY_BYTES,
            ));
        }
    }

    // -- Server: max_batch_lines --
    if let Some(lines) = raw.server.max_batch_lines {
        if (1..=constants::ABSOLUTE_MAX_BATCH_LINES).contains(&lines) {
            config.max_batch_lines = lines;
        } else {
            warnings.push(format!(
                "{}. Using default ({}).",
                out_of_range(
                    "server.max_batch_lines",
                    lines,
                    format!("1-{}", constants::ABSOLUTE_MAX_BATCH_LINES),
                ),
                constants::DEFAULT_MAX_BATCH_LINES,
            ));
        }
    }

    // -- Server: cors_origins --
    if let Some(origins) = raw.server.cors_origins {
        let mut accepted = Vec::with_capacity(origins.len());
        for origin in &origins {
            match normalise_origin(origin) {
                Some(o) => accepted.push(o),
                None => warnings.push(format!(
                    "{}. Entry ignored.",
                    out_of_range(
                        "server.cors_origins",
                        origin,
                        "\"*\" or an http(s) origin such as http://localhost:3000".to_string(),
                    ),
                )),
            }
        }
        config.cors_origins = accepted;
    }

    // -- Ingest: default_service_name --
    if let Some(name) = raw.ingest.default_service_name {
        let trimmed = name.trim();
        if !trimmed.is_empty() && trimmed.chars().count() <= constants::MAX_SERVICE_NAME_CHARS {
            config.default_service_name = trimmed.to_string();
        } else {
            warnings.push(format!(
                "{}. Using default ({}).",
                out_of_range(
                    "ingest.default_service_name",
                    &name,
                    format!("1-{} visible characters", constants::MAX_SERVICE_NAME_CHARS),
                ),
                constants::DEFAULT_SERVICE_NAME,
            ));
        }
    }

    // -- Engine: base_url --
    if let Some(url) = raw.engine.base_url {
        if engine::analyze_endpoint(&url).is_ok() {
            config.engine_url = url;
        } else {
            warnings.push(format!(
                "{}. Using default ({}).",
                out_of_range("engine.base_url", &url, "an http:// or https:// URL".to_string()),
                constants::DEFAULT_ENGINE_URL,
            ));
        }
    }

    // -- Engine: timeout_secs --
    if let Some(secs) = raw.engine.timeout_secs {
        if (constants::MIN_ENGINE_TIMEOUT_SECS..=constants::MAX_ENGINE_TIMEOUT_SECS).contains(&secs)
        {
            config.engine_timeout_secs = secs;
        } else {
            warnings.push(format!(
                "{}. Using default ({}).",
                out_of_range(
                    "engine.timeout_secs",
                    secs,
                    format!(
                        "{}-{}",
                        constants::MIN_ENGINE_TIMEOUT_SECS,
                        constants::MAX_ENGINE_TIMEOUT_SECS
                    ),
                ),
                constants::DEFAULT_ENGINE_TIMEOUT_SECS,
            ));
        }
    }

    // -- Storage: backend / path --
    let sqlite_path = raw
        .storage
        .path
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| default_db.to_path_buf());
    match raw.storage.backend.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("memory") => {}
        Some("sqlite") => config.storage = StorageBackend::Sqlite { path: sqlite_path },
        Some(other) => warnings.push(format!(
            "[storage] backend = \"{other}\" is not recognised. Expected \"memory\" or \"sqlite\". Using default (memory).",
        )),
    }

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level);
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    config
}
