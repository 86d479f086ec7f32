// LogIntel - core/filter.rs
//
// Field filter over stored records. All set fields are AND-combined.
// Core layer: pure logic, no I/O.

use crate::core::model::LogRecord;
use serde::Deserialize;

/// Field filter for record listing. Empty means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordFilter {
    /// Level token to match (case-insensitive). None = any level.
    #[serde(default)]
    pub level: Option<String>,

    /// Exact service label to match. None = any service.
    #[serde(default, alias = "serviceName")]
    pub service: Option<String>,
}

impl RecordFilter {
    /// Filter on a single level, mirroring the store's find-by-level query.
    pub fn by_level(level: impl Into<String>) -> Self {
        Self {
            level: Some(level.into()),
            service: None,
        }
    }

    /// Returns true if no filters are active. Blank values count as unset.
    pub fn is_empty(&self) -> bool {
        self.level().is_none() && self.service().is_none()
    }

    /// Active level criterion, ignoring blank values.
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Active service criterion, ignoring blank values.
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Check a single record against every active criterion.
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(level) = self.level() {
            if !record.level.eq_ignore_ascii_case(level) {
                return false;
            }
        }
        if let Some(service) = self.service() {
            if record.service_name != service {
                return false;
            }
        }
        true
    }

    /// Apply the filter to a slice, preserving order.
    pub fn apply<'a>(&self, records: &'a [LogRecord]) -> Vec<&'a LogRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: u64, level: &str, service: &str) -> LogRecord {
        LogRecord {
            id,
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            level: level.to_string(),
            service_name: service.to_string(),
            message: format!("message {id}"),
            raw_line: format!("raw {id}"),
        }
    }

    fn records() -> Vec<LogRecord> {
        vec![
            record(1, "ERROR", "orders"),
            record(2, "INFO", "orders"),
            record(3, "error", "billing"),
            record(4, "UNKNOWN", "default-service"),
        ]
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let f = RecordFilter::default();
        assert!(f.is_empty());
        assert_eq!(f.apply(&records()).len(), 4);
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let f = RecordFilter {
            level: Some("  ".to_string()),
            service: Some(String::new()),
        };
        assert!(f.is_empty());
    }

    #[test]
    fn test_level_is_case_insensitive() {
        let recs = records();
        let ids: Vec<u64> = RecordFilter::by_level("Error")
            .apply(&recs)
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_level_and_service_are_and_combined() {
        let recs = records();
        let f = RecordFilter {
            level: Some("ERROR".to_string()),
            service: Some("orders".to_string()),
        };
        let ids: Vec<u64> = f.apply(&recs).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_service_is_exact_match() {
        let recs = records();
        let f = RecordFilter {
            level: None,
            service: Some("Orders".to_string()),
        };
        assert!(f.apply(&recs).is_empty());
    }
}
