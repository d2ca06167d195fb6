//! Batch pipeline - the top-level supervisor around the per-file
//! detection -> mapping -> dedup -> policy path.
//!
//! Each file's scan is pure and independent; a rayon worker pool processes
//! many files in parallel sharing only the immutable mapping tables and
//! baseline dataset. The only mutable shared state is the warning/result
//! accumulator behind a single mutex. Cancellation halts submission of new
//! files; in-flight scans run to completion.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::baseline::BaselineDataset;
use crate::dedupe::dedupe_records;
use crate::error::Result;
use crate::mapping::{resolve, MappingTables};
use crate::policy::{evaluate, PolicyConfig};
use crate::scanners::detect_features_checked;
use crate::types::{BatchReport, FileScan, ScanWarning};

/// One `(file path, raw text)` pair from the external loader. The core
/// performs no filesystem access of its own.
#[derive(Debug, Clone)]
pub struct ScanInput {
    pub path: String,
    pub text: String,
}

impl ScanInput {
    pub fn new<P: Into<String>, T: Into<String>>(path: P, text: T) -> Self {
        Self { path: path.into(), text: text.into() }
    }
}

/// Run one file through detection, resolution, deduplication, and policy
/// evaluation. Recoverable failures become a warning on the result; they
/// never propagate.
pub fn scan_source(
    input: &ScanInput,
    tables: &MappingTables,
    dataset: &BaselineDataset,
    policy: &PolicyConfig,
) -> FileScan {
    let path = Path::new(&input.path);
    let (occurrences, warning) = match detect_features_checked(&input.text, path, tables) {
        Ok(occurrences) => (occurrences, None),
        Err(err) => {
            warn!(path = %input.path, error = %err, "recoverable scan failure");
            (Vec::new(), Some(ScanWarning::new(input.path.as_str(), err.to_string())))
        }
    };

    let occurrences_seen = occurrences.len();
    let records =
        dedupe_records(occurrences.iter().filter_map(|occ| resolve(tables, occ)).collect());
    let records_resolved = records.len();
    let violations =
        records.iter().filter_map(|record| evaluate(record, policy, dataset)).collect();

    debug!(
        path = %input.path,
        occurrences = occurrences_seen,
        resolved = records_resolved,
        "file scanned"
    );
    FileScan { violations, warning, occurrences_seen, records_resolved }
}

/// A configured scan batch: immutable tables, dataset, and validated
/// policy, shared read-only by every worker.
#[derive(Debug)]
pub struct ScanBatch {
    tables: MappingTables,
    dataset: BaselineDataset,
    policy: PolicyConfig,
}

impl ScanBatch {
    pub fn new(tables: MappingTables, dataset: BaselineDataset, policy: PolicyConfig) -> Self {
        Self { tables, dataset, policy }
    }

    /// Scan a batch of inputs in parallel.
    ///
    /// The explicit top-level supervisor: every per-file failure is
    /// downgraded to a warning on the report, and violations are sorted by
    /// `(file, line, column, rule, feature)` so the output is byte-stable
    /// regardless of worker scheduling.
    pub fn scan(&self, inputs: &[ScanInput]) -> Result<BatchReport> {
        self.scan_with_cancellation(inputs, &AtomicBool::new(false))
    }

    /// Like [`scan`](Self::scan), but checks `cancel` before picking up
    /// each file. Cancellation stops submission of new files; scans
    /// already in flight run to completion and their results are kept.
    pub fn scan_with_cancellation(
        &self,
        inputs: &[ScanInput],
        cancel: &AtomicBool,
    ) -> Result<BatchReport> {
        let results: Mutex<Vec<FileScan>> = Mutex::new(Vec::with_capacity(inputs.len()));
        let files_scanned = AtomicUsize::new(0);

        inputs.par_iter().for_each(|input| {
            if cancel.load(Ordering::SeqCst) {
                return;
            }
            let scan = scan_source(input, &self.tables, &self.dataset, &self.policy);
            files_scanned.fetch_add(1, Ordering::SeqCst);
            results
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(scan);
        });

        let results = results.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut report = BatchReport::new();
        report.files_scanned = files_scanned.load(Ordering::SeqCst);
        for scan in results {
            report.occurrences_seen += scan.occurrences_seen;
            report.records_resolved += scan.records_resolved;
            report.violations.extend(scan.violations);
            report.warnings.extend(scan.warning);
        }
        report.violations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        report.warnings.sort_by(|a, b| (&a.path, &a.detail).cmp(&(&b.path, &b.detail)));

        info!(
            files = report.files_scanned,
            violations = report.violations.len(),
            warnings = report.warnings.len(),
            "batch complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Maturity;

    fn batch() -> ScanBatch {
        let dataset = BaselineDataset::empty()
            .with_feature("grid", Maturity::Widely)
            .with_feature("flexbox-gap", Maturity::Newly)
            .with_feature("has", Maturity::Newly)
            .with_feature("anchor-positioning", Maturity::Limited);
        ScanBatch::new(MappingTables::builtin(), dataset, PolicyConfig::default())
    }

    #[test]
    fn single_file_pipeline_produces_expected_violations() {
        let input = ScanInput::new(
            "styles.css",
            ".container { display: grid; gap: 20px; }\n.card:has(img) { anchor-name: --a; }",
        );
        let report = batch().scan(std::slice::from_ref(&input)).unwrap();

        // grid is widely available -> allowed; gap, :has, anchor-name flagged
        let features: Vec<&str> =
            report.violations.iter().map(|v| v.feature_id.as_str()).collect();
        assert!(!features.contains(&"grid"));
        assert!(features.contains(&"flexbox-gap"));
        assert!(features.contains(&"has"));
        assert!(features.contains(&"anchor-positioning"));
    }

    #[test]
    fn duplicate_feature_positions_collapse_before_policy() {
        // the same declaration twice on one line would be two distinct
        // positions; the same position dedupes
        let input = ScanInput::new("a.css", ".x { gap: 1px; gap: 2px; }");
        let report = batch().scan(&[input]).unwrap();
        let gaps: Vec<_> =
            report.violations.iter().filter(|v| v.feature_id == "flexbox-gap").collect();
        assert_eq!(gaps.len(), 2);
        assert_ne!((gaps[0].line, gaps[0].column), (gaps[1].line, gaps[1].column));
    }

    #[test]
    fn cancellation_stops_new_submissions() {
        let inputs: Vec<ScanInput> = (0..64)
            .map(|i| ScanInput::new(format!("f{i}.css"), ".x { gap: 1px; }"))
            .collect();
        let cancel = AtomicBool::new(true);
        let report = batch().scan_with_cancellation(&inputs, &cancel).unwrap();
        assert_eq!(report.files_scanned, 0);
        assert!(report.violations.is_empty());
    }
}
