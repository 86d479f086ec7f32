// LogIntel - tests/e2e_api.rs
//
// End-to-end tests over real sockets: the full router on 127.0.0.1:0, a
// real reqwest client, and a stand-in analysis engine served by axum.
// Stores are real (in-memory and SQLite); nothing is mocked below the
// HTTP boundary except the engine itself.

use axum::http::StatusCode as AxumStatus;
use axum::routing::post;
use axum::{Json, Router};
use logintel::app::analysis::AnalysisService;
use logintel::app::contracts::LogStore;
use logintel::app::ingest::IngestService;
use logintel::core::model::{AnalysisResult, LogRecord};
use logintel::platform::engine::HttpAnalysisEngine;
use logintel::platform::server::{self, AppState, CorsPolicy};
use logintel::platform::sqlite::SqliteStore;
use logintel::platform::store::MemoryStore;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Helpers
// =============================================================================

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Engine stand-in that reports one cluster per distinct level it was sent.
fn counting_engine(calls: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/analyze",
        post(move |Json(body): Json<Value>| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let logs = body["logs"].as_array().cloned().unwrap_or_default();
                let errors = logs.iter().filter(|l| l["level"] == "ERROR").count();
                Json(json!({
                    "clusters": [
                        {
                            "pattern": "Connection errors",
                            "count": errors,
                            "explanation": "Downstream refused connections.",
                            "suggestedFix": "Check the database host."
                        },
                        {
                            "pattern": "Other logs",
                            "count": logs.len() - errors,
                            "explanation": "Everything else.",
                            "suggestedFix": "None."
                        }
                    ],
                    "overallSummary": format!("{} logs analysed", logs.len())
                }))
            }
        }),
    )
}

struct Harness {
    base: String,
    client: reqwest::Client,
    store: Arc<dyn LogStore>,
}

async fn start(store: Arc<dyn LogStore>, engine_url: &str, max_batch_lines: usize) -> Harness {
    start_with_cors(store, engine_url, max_batch_lines, &["*"]).await
}

async fn start_with_cors(
    store: Arc<dyn LogStore>,
    engine_url: &str,
    max_batch_lines: usize,
    origins: &[&str],
) -> Harness {
    let engine = HttpAnalysisEngine::new(engine_url, Duration::from_secs(5)).unwrap();
    let state = AppState {
        ingest: Arc::new(IngestService::new(
            Arc::clone(&store),
            "default-service",
            max_batch_lines,
        )),
        analysis: Arc::new(AnalysisService::new(
            Arc::clone(&store),
            Arc::new(engine),
            Duration::from_secs(5),
        )),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
    let router = server::build_router(state, 1024 * 1024, CorsPolicy::new(&origins));
    tokio::spawn(server::serve(listener, router, std::future::pending()));
    Harness {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        store,
    }
}

impl Harness {
    async fn ingest(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/logs/ingest", self.base))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn preflight(&self, path: &str, origin: &str) -> reqwest::Response {
        self.client
            .request(reqwest::Method::OPTIONS, format!("{}{path}", self.base))
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap()
    }
}

fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// =============================================================================
// Ingest and listing
// =============================================================================

#[tokio::test]
async fn ingest_returns_records_in_input_order() {
    let h = start(Arc::new(MemoryStore::new()), &unreachable_url(), 1000).await;
    let resp = h
        .ingest(json!({
            "lines": [
                "2025-12-05 10:15:30 ERROR OrderService - Failed to connect",
                "this is not structured",
                ""
            ],
            "serviceName": "orders"
        }))
        .await;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let records: Vec<LogRecord> = resp.json().await.unwrap();
    assert_eq!(records.len(), 3);

    assert_eq!(records[0].level, "ERROR");
    assert_eq!(records[0].message, "OrderService - Failed to connect");
    assert_eq!(records[0].timestamp.to_string(), "2025-12-05 10:15:30");
    assert_eq!(records[1].level, "UNKNOWN");
    assert_eq!(records[1].message, "this is not structured");
    assert_eq!(records[2].raw_line, "");
    assert!(records.iter().all(|r| r.service_name == "orders"));
    assert!(records.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn ingest_wire_shape_is_camel_case() {
    let h = start(Arc::new(MemoryStore::new()), &unreachable_url(), 1000).await;
    let body: Value = h
        .ingest(json!({"lines": ["2025-12-05 10:15:30 INFO up"]}))
        .await
        .json()
        .await
        .unwrap();
    let rec = &body[0];
    assert_eq!(rec["serviceName"], "default-service");
    assert_eq!(rec["rawLine"], "2025-12-05 10:15:30 INFO up");
    assert_eq!(rec["timestamp"], "2025-12-05T10:15:30");
    assert!(rec.get("service_name").is_none());
}

#[tokio::test]
async fn list_returns_everything_and_filters_by_level_and_service() {
    let h = start(Arc::new(MemoryStore::new()), &unreachable_url(), 1000).await;
    h.ingest(json!({
        "lines": ["2025-12-05 10:15:30 ERROR a", "2025-12-05 10:15:31 INFO b"],
        "serviceName": "orders"
    }))
    .await;
    h.ingest(json!({"lines": ["2025-12-05 10:15:32 ERROR c"], "serviceName": "billing"}))
        .await;

    let all: Vec<LogRecord> = h.get("/api/logs").await.json().await.unwrap();
    assert_eq!(all.len(), 3);

    let errors: Vec<LogRecord> = h.get("/api/logs?level=error").await.json().await.unwrap();
    assert_eq!(errors.iter().map(|r| r.message.as_str()).collect::<Vec<_>>(), ["a", "c"]);

    let billing: Vec<LogRecord> = h
        .get("/api/logs?level=ERROR&service=billing")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(billing.len(), 1);
    assert_eq!(billing[0].message, "c");
}

#[tokio::test]
async fn oversized_batch_is_rejected_and_nothing_persists() {
    let h = start(Arc::new(MemoryStore::new()), &unreachable_url(), 2).await;
    let resp = h.ingest(json!({"lines": ["a", "b", "c"]})).await;
    assert_eq!(resp.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "batch_too_large");
    assert_eq!(h.store.count().unwrap(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let h = start(Arc::new(MemoryStore::new()), &unreachable_url(), 10).await;
    let resp = h
        .client
        .post(format!("{}/api/logs/ingest", h.base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn sqlite_backed_service_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("logs.db")).unwrap());
    let h = start(store, &unreachable_url(), 1000).await;
    let ingested: Vec<LogRecord> = h
        .ingest(json!({"lines": ["2025-12-05 10:15:30 WARN disk 91%", "garbage"]}))
        .await
        .json()
        .await
        .unwrap();
    let listed: Vec<LogRecord> = h.get("/api/logs").await.json().await.unwrap();
    assert_eq!(listed, ingested);
}

#[tokio::test]
async fn healthz_answers_ok() {
    let h = start(Arc::new(MemoryStore::new()), &unreachable_url(), 10).await;
    let resp = h.get("/healthz").await;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

// =============================================================================
// Analysis
// =============================================================================

#[tokio::test]
async fn analysis_delegates_full_corpus_and_returns_engine_answer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = spawn(counting_engine(Arc::clone(&calls))).await;
    let h = start(Arc::new(MemoryStore::new()), &engine, 1000).await;
    h.ingest(json!({"lines": [
        "2025-12-05 10:15:30 ERROR db refused",
        "2025-12-05 10:15:31 ERROR db refused",
        "noise"
    ]}))
    .await;

    let resp = h.get("/api/analysis").await;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let result: AnalysisResult = resp.json().await.unwrap();
    assert_eq!(result.overall_summary, "3 logs analysed");
    assert_eq!(result.clusters[0].pattern, "Connection errors");
    assert_eq!(result.clusters[0].count, 2);
    assert_eq!(result.clusters[1].count, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn analysis_with_engine_down_is_503() {
    let h = start(Arc::new(MemoryStore::new()), &unreachable_url(), 10).await;
    let resp = h.get("/api/analysis").await;
    assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "engine_unavailable");
}

#[tokio::test]
async fn analysis_with_engine_error_status_is_502() {
    let engine = spawn(Router::new().route(
        "/analyze",
        post(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "engine exploded") }),
    ))
    .await;
    let h = start(Arc::new(MemoryStore::new()), &engine, 10).await;
    let resp = h.get("/api/analysis").await;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "engine_status");
}

#[tokio::test]
async fn analysis_with_malformed_engine_body_is_502() {
    let engine = spawn(Router::new().route(
        "/analyze",
        post(|| async { Json(json!({"summary": "wrong shape"})) }),
    ))
    .await;
    let h = start(Arc::new(MemoryStore::new()), &engine, 10).await;
    let resp = h.get("/api/analysis").await;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "engine_malformed_response");
}

// =============================================================================
// Cross-origin access
// =============================================================================

fn header<'a>(resp: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn preflight_is_answered_for_any_origin_by_default() {
    let h = start(Arc::new(MemoryStore::new()), &unreachable_url(), 10).await;
    let resp = h.preflight("/api/logs/ingest", "http://localhost:3000").await;
    assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);
    assert_eq!(header(&resp, "access-control-allow-origin"), Some("*"));
    assert!(header(&resp, "access-control-allow-methods").unwrap().contains("POST"));
    assert_eq!(header(&resp, "access-control-allow-headers"), Some("content-type"));
    assert_eq!(h.store.count().unwrap(), 0);
}

#[tokio::test]
async fn plain_requests_carry_allow_origin() {
    let h = start(Arc::new(MemoryStore::new()), &unreachable_url(), 10).await;
    let resp = h
        .client
        .get(format!("{}/api/logs", h.base))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(header(&resp, "access-control-allow-origin"), Some("*"));

    let resp = h
        .client
        .post(format!("{}/api/logs/ingest", h.base))
        .header("origin", "http://localhost:3000")
        .json(&json!({"lines": ["2025-12-05 10:15:30 INFO up"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(header(&resp, "access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn listed_origin_is_echoed_and_others_are_not() {
    let h = start_with_cors(
        Arc::new(MemoryStore::new()),
        &unreachable_url(),
        10,
        &["http://dashboard.local:8080"],
    )
    .await;
    let resp = h.preflight("/api/logs/ingest", "http://dashboard.local:8080").await;
    assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);
    assert_eq!(
        header(&resp, "access-control-allow-origin"),
        Some("http://dashboard.local:8080")
    );

    let resp = h.preflight("/api/logs/ingest", "http://elsewhere.local").await;
    assert!(header(&resp, "access-control-allow-origin").is_none());

    let resp = h
        .client
        .get(format!("{}/api/logs", h.base))
        .header("origin", "http://elsewhere.local")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert!(header(&resp, "access-control-allow-origin").is_none());
    assert_eq!(header(&resp, "vary"), Some("Origin"));
}

#[tokio::test]
async fn empty_origin_list_disables_cross_origin_access() {
    let h = start_with_cors(Arc::new(MemoryStore::new()), &unreachable_url(), 10, &[]).await;
    let resp = h.preflight("/api/logs/ingest", "http://localhost:3000").await;
    assert_eq!(resp.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
    assert!(header(&resp, "access-control-allow-origin").is_none());
}
