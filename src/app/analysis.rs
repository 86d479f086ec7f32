// LogIntel - app/analysis.rs
//
// Analysis orchestration: read the full corpus, hand it to the engine,
// return the engine's answer as-is.
//
// One invocation has two states, awaiting-engine-response and done. There
// is no retry, no cache and no fabricated fallback: any store or engine
// failure is returned to the caller. The engine call is bounded by an
// explicit timeout; dropping the returned future cancels the call.

use crate::app::contracts::{AnalysisEngine, LogStore};
use crate::core::model::AnalysisResult;
use crate::util::error::{AnalysisError, EngineError, StoreError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Analysis orchestrator.
pub struct AnalysisService {
    store: Arc<dyn LogStore>,
    engine: Arc<dyn AnalysisEngine>,
    timeout: Duration,
}

impl AnalysisService {
    pub fn new(
        store: Arc<dyn LogStore>,
        engine: Arc<dyn AnalysisEngine>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            engine,
            timeout,
        }
    }

    /// Analyse every stored record. The corpus read runs on the blocking pool.
    pub async fn analyze_all(&self) -> Result<AnalysisResult, AnalysisError> {
        let store = Arc::clone(&self.store);
        let read = tokio::task::spawn_blocking(move || store.find_all())
            .await
            .unwrap_or_else(|e| {
                Err(StoreError::Unavailable {
                    reason: format!("corpus read task failed: {e}"),
                })
            });
        let logs = read.map_err(|e| {
            tracing::error!(error = %e, "Analysis aborted: corpus read failed");
            AnalysisError::Store(e)
        })?;

        // TODO: window the corpus once a retention policy exists; today the
        // whole history goes out in one request.
        tracing::debug!(
            records = logs.len(),
            engine = self.engine.endpoint(),
            "Sending corpus to analysis engine"
        );

        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.engine.analyze(&logs)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, code = e.code(), "Analysis engine call failed");
                return Err(AnalysisError::Engine(e));
            }
            Err(_) => {
                let e = EngineError::Timeout {
                    endpoint: self.engine.endpoint().to_string(),
                    after: self.timeout,
                };
                tracing::warn!(error = %e, "Analysis engine call timed out");
                return Err(AnalysisError::Engine(e));
            }
        };

        tracing::info!(
            records = logs.len(),
            clusters = result.clusters.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis completed"
        );
        Ok(result)
    }
}
