// LogIntel - main.rs
//
// Service entry point. Handles:
// 1. CLI argument parsing
// 2. Logging initialisation (debug mode support)
// 3. Configuration loading (config.toml + CLI overrides), then the
//    config's log level is applied to the running subscriber
// 4. Store, engine client and orchestrator construction
// 5. HTTP server launch with graceful shutdown

use clap::Parser;
use logintel::app::analysis::AnalysisService;
use logintel::app::ingest::IngestService;
use logintel::platform::config::{self, AppConfig, PlatformPaths, StorageBackend};
use logintel::platform::engine::HttpAnalysisEngine;
use logintel::platform::{server, store};
use logintel::util::{self, error};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// LogIntel - log ingestion and error-cluster analysis service.
///
/// Accepts raw log lines over HTTP, normalises and stores them, and
/// delegates clustering of the stored corpus to an external engine.
#[derive(Parser, Debug)]
#[command(name = "logintel", version, about)]
struct Cli {
    /// Path to config.toml (default: platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Listen address, overrides `[server] bind`.
    #[arg(short = 'b', long = "bind")]
    bind: Option<String>,

    /// Analysis engine base URL, overrides `[engine] base_url`.
    #[arg(short = 'e', long = "engine-url")]
    engine_url: Option<String>,

    /// Store records in this SQLite database, overrides `[storage]`.
    #[arg(long = "db")]
    db: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

/// Fold CLI overrides into the validated file configuration.
fn apply_overrides(mut config: AppConfig, cli: &Cli) -> AppConfig {
    if let Some(ref bind) = cli.bind {
        config.bind_addr = bind.clone();
    }
    if let Some(ref url) = cli.engine_url {
        config.engine_url = url.clone();
    }
    if let Some(ref db) = cli.db {
        config.storage = StorageBackend::Sqlite { path: db.clone() };
    }
    config
}

async fn run(config: AppConfig) -> error::Result<()> {
    let store = store::open_store(&config.storage)?;
    let engine = HttpAnalysisEngine::new(
        &config.engine_url,
        Duration::from_secs(config.engine_timeout_secs),
    )?;

    let state = server::AppState {
        ingest: Arc::new(IngestService::new(
            Arc::clone(&store),
            config.default_service_name.clone(),
            config.max_batch_lines,
        )),
        analysis: Arc::new(AnalysisService::new(
            store,
            Arc::new(engine),
            Duration::from_secs(config.engine_timeout_secs),
        )),
    };

    let cors = server::CorsPolicy::new(&config.cors_origins);
    let router = server::build_router(state, config.max_body_bytes, cors);
    let listener = server::bind(&config.bind_addr).await?;
    server::serve(listener, router, server::shutdown_signal()).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = util::logging::init(cli.debug, None);

    let platform_paths = PlatformPaths::resolve();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| platform_paths.config_file());
    let (file_config, warnings) =
        config::load_config(&config_path, &platform_paths.database_file());
    let config = apply_overrides(file_config, &cli);

    logging.apply_config_level(config.log_level.as_deref());
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        version = util::constants::APP_VERSION,
        bind = %config.bind_addr,
        engine = %config.engine_url,
        storage = ?config.storage,
        cors_origins = ?config.cors_origins,
        "LogIntel starting"
    );

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Fatal error");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
