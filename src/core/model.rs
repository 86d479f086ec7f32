// LogIntel - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers and double as
// the JSON wire shapes (camelCase field names).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// =============================================================================
// Log Record (normalised output of parsing)
// =============================================================================

/// A persisted, normalised log line.
///
/// Created once by ingestion and never mutated afterwards. Every field is
/// populated whether the line parsed strictly or degraded to the
/// `UNKNOWN` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Store-assigned identifier.
    pub id: u64,

    /// When the event occurred; ingestion time for degraded lines.
    pub timestamp: NaiveDateTime,

    /// Free-form severity token (INFO, WARN, ERROR...) or `UNKNOWN`.
    pub level: String,

    /// Label of the producing application or module. Never empty.
    pub service_name: String,

    /// Parsed payload, bounded at `MAX_MESSAGE_CHARS`.
    pub message: String,

    /// Original input line, bounded at `MAX_RAW_LINE_CHARS`.
    pub raw_line: String,
}

/// A parsed record that has not been persisted yet (no identifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogRecord {
    pub timestamp: NaiveDateTime,
    pub level: String,
    pub service_name: String,
    pub message: String,
    pub raw_line: String,
}

impl NewLogRecord {
    /// Attach a store-assigned identifier.
    pub fn with_id(self, id: u64) -> LogRecord {
        LogRecord {
            id,
            timestamp: self.timestamp,
            level: self.level,
            service_name: self.service_name,
            message: self.message,
            raw_line: self.raw_line,
        }
    }
}

// =============================================================================
// Analysis (returned, never stored)
// =============================================================================

/// One group of recurring errors, as produced by the analysis engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCluster {
    /// Representative text or signature.
    pub pattern: String,

    /// Number of log lines in the cluster.
    pub count: u64,

    /// What is going wrong.
    pub explanation: String,

    /// Concrete remediation.
    pub suggested_fix: String,
}

/// The engine's answer. Cluster order is the engine's and is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub clusters: Vec<ErrorCluster>,
    pub overall_summary: String,
}

// =============================================================================
// Request shapes
// =============================================================================

/// Body of `POST /api/logs/ingest`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    /// Raw lines in submission order. A missing field is an empty batch.
    #[serde(default)]
    pub lines: Vec<String>,

    /// Optional producing-service label.
    #[serde(default)]
    pub service_name: Option<String>,
}

/// Body sent to the engine's `/analyze` operation.
#[derive(Debug, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub logs: &'a [LogRecord],
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_record() -> LogRecord {
        LogRecord {
            id: 7,
            timestamp: NaiveDate::from_ymd_opt(2025, 12, 5)
                .unwrap()
                .and_hms_opt(10, 15, 30)
                .unwrap(),
            level: "ERROR".to_string(),
            service_name: "orders".to_string(),
            message: "OrderService - Failed to connect".to_string(),
            raw_line: "2025-12-05 10:15:30 ERROR OrderService - Failed to connect".to_string(),
        }
    }

    #[test]
    fn test_log_record_wire_shape_is_camel_case() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["timestamp"], "2025-12-05T10:15:30");
        assert_eq!(json["serviceName"], "orders");
        assert_eq!(
            json["rawLine"],
            "2025-12-05 10:15:30 ERROR OrderService - Failed to connect"
        );
        assert!(json.get("service_name").is_none());
    }

    #[test]
    fn test_ingest_request_service_name_is_optional() {
        let req: IngestRequest = serde_json::from_str(r#"{"lines":["a","b"]}"#).unwrap();
        assert_eq!(req.lines, vec!["a", "b"]);
        assert!(req.service_name.is_none());

        let req: IngestRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(req.lines.is_empty());
    }

    #[test]
    fn test_analysis_result_decodes_engine_shape_in_order() {
        let body = r#"{
            "clusters": [
                {"pattern": "Timeout errors", "count": 3, "explanation": "slow", "suggestedFix": "retry"},
                {"pattern": "Other logs", "count": 1, "explanation": "misc", "suggestedFix": "inspect"}
            ],
            "overallSummary": "Analyzed 4 log entries",
            "model": "ignored-extra-field"
        }"#;
        let result: AnalysisResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.clusters[0].pattern, "Timeout errors");
        assert_eq!(result.clusters[0].suggested_fix, "retry");
        assert_eq!(result.clusters[1].count, 1);
        assert_eq!(result.overall_summary, "Analyzed 4 log entries");
    }

    #[test]
    fn test_analyze_request_wraps_logs() {
        let logs = vec![sample_record()];
        let json = serde_json::to_value(AnalyzeRequest { logs: &logs }).unwrap();
        assert_eq!(json["logs"][0]["level"], "ERROR");
    }

    #[test]
    fn test_with_id_keeps_fields() {
        let rec = sample_record();
        let new = NewLogRecord {
            timestamp: rec.timestamp,
            level: rec.level.clone(),
            service_name: rec.service_name.clone(),
            message: rec.message.clone(),
            raw_line: rec.raw_line.clone(),
        };
        assert_eq!(new.with_id(7), rec);
    }
}
