// LogIntel - platform/engine.rs
//
// HTTP client for the external analysis engine: one POST of the full
// corpus to `{base_url}/analyze`, JSON in and JSON out.

use crate::app::contracts::AnalysisEngine;
use crate::core::model::{AnalysisResult, AnalyzeRequest, LogRecord};
use crate::util::constants;
use crate::util::error::EngineError;
use async_trait::async_trait;
use std::time::Duration;

/// Engine client over `reqwest`. Cheap to clone; the connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpAnalysisEngine {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    endpoint_str: String,
    timeout: Duration,
}

impl HttpAnalysisEngine {
    /// Build a client for the engine rooted at `base_url`.
    ///
    /// `timeout` bounds the whole round-trip at the transport level as well;
    /// the analysis orchestrator applies the same bound around the call.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let endpoint = analyze_endpoint(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(format!("{}/{}", constants::APP_NAME, constants::APP_VERSION))
            .build()
            .map_err(|e| EngineError::InvalidEndpoint {
                url: base_url.to_string(),
                reason: format!("HTTP client could not be built: {e}"),
            })?;
        let endpoint_str = endpoint.to_string();
        tracing::debug!(
            endpoint = %endpoint_str,
            timeout_secs = timeout.as_secs(),
            "Engine client ready"
        );
        Ok(Self {
            client,
            endpoint,
            endpoint_str,
            timeout,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> EngineError {
        if e.is_timeout() {
            EngineError::Timeout {
                endpoint: self.endpoint_str.clone(),
                after: self.timeout,
            }
        } else {
            EngineError::Unavailable {
                endpoint: self.endpoint_str.clone(),
                source: e,
            }
        }
    }
}

/// `{base_url}/analyze`, tolerating a trailing slash on the base.
pub(crate) fn analyze_endpoint(base_url: &str) -> Result<reqwest::Url, EngineError> {
    let invalid = |reason: String| EngineError::InvalidEndpoint {
        url: base_url.to_string(),
        reason,
    };
    let trimmed = base_url.trim().trim_end_matches('/');
    let url = reqwest::Url::parse(&format!("{trimmed}{}", constants::ENGINE_ANALYZE_PATH))
        .map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

#[async_trait]
impl AnalysisEngine for HttpAnalysisEngine {
    fn endpoint(&self) -> &str {
        &self.endpoint_str
    }

    async fn analyze(&self, logs: &[LogRecord]) -> Result<AnalysisResult, EngineError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&AnalyzeRequest { logs })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                endpoint: self.endpoint_str.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice::<AnalysisResult>(&body).map_err(|e| {
            EngineError::MalformedResponse {
                endpoint: self.endpoint_str.clone(),
                reason: e.to_string(),
            }
        })
    }
}
