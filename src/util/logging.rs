// LogIntel - util/logging.rs
//
// Structured logging with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug
//   - Config file: [logging] level = "debug"
//
// Output: stderr. Never logs full raw lines; previews are capped at
// DEBUG_MAX_LINE_PREVIEW characters.

use super::constants;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Handle for re-applying the filter once config.toml has been read.
///
/// Logging starts before the config file is loaded so that config loading
/// itself is logged; the config level is folded in afterwards.
pub struct LogFilterHandle {
    reload: Option<reload::Handle<EnvFilter, Registry>>,
    debug_flag: bool,
}

impl LogFilterHandle {
    /// Re-apply the priority chain with the level from config.toml.
    /// A no-op when another subscriber was already installed.
    pub fn apply_config_level(&self, config_level: Option<&str>) {
        let Some(ref handle) = self.reload else {
            return;
        };
        if let Err(e) = handle.reload(build_filter(self.debug_flag, config_level)) {
            tracing::warn!(error = %e, "Could not apply configured log level");
        }
    }
}

/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "info".
fn build_filter(debug_flag: bool, config_level: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(constants::DEFAULT_LOG_LEVEL)
    }
}

/// Initialise the logging subsystem.
///
/// `debug_flag` is true when the user passed --debug on the CLI.
/// `config_level` is the level from config.toml, if already known.
///
/// Calling this more than once is harmless; later calls are ignored and
/// return a handle whose reloads do nothing.
pub fn init(debug_flag: bool, config_level: Option<&str>) -> LogFilterHandle {
    let (filter, handle) = reload::Layer::new(build_filter(debug_flag, config_level));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            app = constants::APP_NAME,
            version = constants::APP_VERSION,
            "Logging initialised"
        );
    }

    LogFilterHandle {
        reload: installed.then_some(handle),
        debug_flag,
    }
}

/// Bounded preview of a raw line for debug output.
pub fn preview(line: &str) -> &str {
    match line.char_indices().nth(constants::DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}
