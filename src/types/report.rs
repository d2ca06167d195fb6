use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::violation::Violation;

/// Recoverable per-file problem, carried alongside results instead of
/// aborting the batch
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: String,
    pub detail: String,
}

impl ScanWarning {
    pub fn new<P: Into<String>, D: Into<String>>(path: P, detail: D) -> Self {
        Self { path: path.into(), detail: detail.into() }
    }
}

/// Result of scanning a single file through the full pipeline
#[derive(Debug, Clone, Default)]
pub struct FileScan {
    pub violations: Vec<Violation>,
    pub warning: Option<ScanWarning>,
    pub occurrences_seen: usize,
    pub records_resolved: usize,
}

/// Batch output handed to reporting collaborators (SARIF, markdown,
/// dashboards). Violations are ordered by `(file, line, column, rule,
/// feature)` regardless of scan scheduling.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchReport {
    /// Schema version (currently "1.0")
    pub schema_version: String,
    pub scanned_at: DateTime<Utc>,
    pub files_scanned: usize,
    pub occurrences_seen: usize,
    pub records_resolved: usize,
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<ScanWarning>,
}

impl BatchReport {
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timestamp(Utc::now())
    }

    /// Explicit timestamp constructor, useful for deterministic tests
    #[must_use]
    pub fn new_with_timestamp(scanned_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            scanned_at,
            files_scanned: 0,
            occurrences_seen: 0,
            records_resolved: 0,
            violations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Highest severity present, if any violation survived policy
    pub fn max_severity(&self) -> Option<crate::types::Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}
