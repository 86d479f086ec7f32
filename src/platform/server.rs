// LogIntel - platform/server.rs
//
// HTTP surface. Thin: each handler decodes the request, calls one
// orchestrator operation and encodes the result. Blocking store work runs
// on the blocking pool so request tasks never stall the runtime.

use crate::app::analysis::AnalysisService;
use crate::app::ingest::IngestService;
use crate::core::filter::RecordFilter;
use crate::core::model::{AnalysisResult, IngestRequest, LogRecord};
use crate::util::constants;
use crate::util::error::{AnalysisError, EngineError, IngestError, LogIntelError, StoreError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub analysis: Arc<AnalysisService>,
}

// =============================================================================
// Error responses
// =============================================================================

/// JSON error response: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": { "code": self.code, "message": self.message }
        }));
        (self.status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "store_failure", e.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match &e {
            EngineError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            EngineError::Status { .. } | EngineError::MalformedResponse { .. } => {
                StatusCode::BAD_GATEWAY
            }
            EngineError::InvalidEndpoint { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.code(), e.to_string())
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::BatchTooLarge { .. } => {
                Self::new(StatusCode::PAYLOAD_TOO_LARGE, "batch_too_large", e.to_string())
            }
            IngestError::Store(e) => e.into(),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::Store(e) => e.into(),
            AnalysisError::Engine(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "payload_too_large"
        } else {
            "invalid_request"
        };
        Self::new(status, code, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        tracing::error!(error = %e, "Blocking store task failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "request worker failed",
        )
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn ingest_handler(
    State(state): State<AppState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<Vec<LogRecord>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Ingest request rejected");
        ApiError::from(rejection)
    })?;
    let ingest = Arc::clone(&state.ingest);
    let records = tokio::task::spawn_blocking(move || ingest.ingest(&request)).await??;
    Ok(Json(records))
}

async fn list_handler(
    State(state): State<AppState>,
    query: Result<Query<RecordFilter>, QueryRejection>,
) -> Result<Json<Vec<LogRecord>>, ApiError> {
    let Query(filter) = query?;
    let ingest = Arc::clone(&state.ingest);
    let records = tokio::task::spawn_blocking(move || ingest.find(&filter)).await??;
    tracing::debug!(records = records.len(), "Listed records");
    Ok(Json(records))
}

async fn analysis_handler(
    State(state): State<AppState>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let result = state.analysis.analyze_all().await?;
    Ok(Json(result))
}

async fn healthz_handler() -> &'static str {
    "ok"
}

// =============================================================================
// Cross-origin access
// =============================================================================

/// Which browser origins may call the API.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    any: bool,
    origins: Vec<String>,
}

impl CorsPolicy {
    /// Build from normalised origins. `*` admits any origin; an empty list
    /// disables cross-origin access.
    pub fn new(origins: &[String]) -> Self {
        Self {
            any: origins.iter().any(|o| o == "*"),
            origins: origins.iter().filter(|o| *o != "*").cloned().collect(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.any || !self.origins.is_empty()
    }

    /// Value for `Access-Control-Allow-Origin`, if `origin` is admitted.
    fn allow_origin(&self, origin: Option<&str>) -> Option<HeaderValue> {
        if self.any {
            return Some(HeaderValue::from_static("*"));
        }
        let origin = origin?;
        if self.origins.iter().any(|o| o == origin.trim_end_matches('/')) {
            HeaderValue::from_str(origin).ok()
        } else {
            None
        }
    }
}

/// Answers preflights directly and stamps the allow-origin header on
/// every other response.
async fn cors_middleware(
    State(cors): State<Arc<CorsPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let allowed = cors.allow_origin(origin.as_deref());

    let preflight = req.method() == Method::OPTIONS
        && req.headers().contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);
    if preflight {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        if let Some(value) = allowed {
            let headers = resp.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET,POST,OPTIONS"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("content-type"),
            );
            headers.insert(
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from(constants::CORS_MAX_AGE_SECS),
            );
        } else {
            tracing::debug!(origin = ?origin, "Preflight from unlisted origin");
        }
        return resp;
    }

    let mut resp = next.run(req).await;
    if let Some(value) = allowed {
        resp.headers_mut().insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    if !cors.any {
        resp.headers_mut().insert(header::VARY, HeaderValue::from_static("Origin"));
    }
    resp
}

// =============================================================================
// Router
// =============================================================================

/// Assemble the router. `max_body_bytes` bounds every request body.
pub fn build_router(state: AppState, max_body_bytes: usize, cors: CorsPolicy) -> Router {
    let router = Router::new()
        .route("/api/logs/ingest", post(ingest_handler))
        .route("/api/logs", get(list_handler))
        .route("/api/analysis", get(analysis_handler))
        .route("/healthz", get(healthz_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state);
    if cors.is_enabled() {
        router.layer(middleware::from_fn_with_state(Arc::new(cors), cors_middleware))
    } else {
        router
    }
}

// =============================================================================
// Serving
// =============================================================================

/// Bind the listen socket.
pub async fn bind(addr: &str) -> Result<TcpListener, LogIntelError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| LogIntelError::Server {
            addr: addr.to_string(),
            source,
        })
}

/// Resolves on Ctrl-C. If the handler cannot be installed the server
/// runs until killed.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received; draining requests"),
        Err(e) => {
            tracing::warn!(error = %e, "Could not install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Serve `router` on `listener` until `shutdown` resolves, then drain.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
) -> Result<(), LogIntelError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    tracing::info!(addr = %addr, "HTTP server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|source| LogIntelError::Server { addr, source })?;
    tracing::info!("HTTP server stopped");
    Ok(())
}
