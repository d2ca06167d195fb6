//! basescan - static Baseline compliance scanning for web source files.
//!
//! This library scans style sheets, scripts, and markup for usages of
//! web-platform features, resolves each usage to a canonical feature
//! identifier, and evaluates it against a configurable Baseline maturity
//! policy, producing structured violations for downstream reporting
//! (SARIF, markdown, dashboards).
//!
//! # Example
//!
//! ```no_run
//! use basescan::{
//!     BaselineDataset, MappingTables, Maturity, PolicyConfig, ScanBatch, ScanInput,
//! };
//!
//! let tables = MappingTables::builtin();
//! let dataset = BaselineDataset::empty().with_feature("grid", Maturity::Widely);
//! let batch = ScanBatch::new(tables, dataset, PolicyConfig::default());
//!
//! let inputs = vec![ScanInput::new("styles.css", ".a { display: grid; gap: 4px; }")];
//! let report = batch.scan(&inputs).unwrap();
//! for violation in &report.violations {
//!     println!(
//!         "{}:{}:{} [{}] {}",
//!         violation.file, violation.line, violation.column, violation.severity,
//!         violation.guidance
//!     );
//! }
//! ```
//!
//! The pipeline is detection -> canonical mapping -> deduplication ->
//! policy evaluation. File loading, dataset fetching, and report
//! rendering are external collaborators feeding the narrow interfaces in
//! [`batch`], [`baseline`], and [`types`].

pub mod baseline;
pub mod batch;
pub mod dedupe;
pub mod error;
pub mod mapping;
pub mod policy;
pub mod resilience;
pub mod scanners;
pub mod types;

// Re-export commonly used types at crate root
pub use baseline::{BaselineDataset, FeatureStatus};
pub use batch::{scan_source, ScanBatch, ScanInput};
pub use dedupe::dedupe_records;
pub use error::{Result, ScanError};
pub use mapping::{resolve, MapEntry, MappingTables};
pub use policy::{evaluate, EnforcementMode, PolicyConfig, RawPolicyConfig, SeverityThresholds};
pub use resilience::{
    retry, with_deadline, Backoff, BreakerConfig, BreakerRegistry, CircuitBreaker, CircuitState,
    RetryPolicy,
};
pub use scanners::{detect_features, detect_features_checked, detect_source_kind, SourceKind};
pub use types::{
    BatchReport, FeatureRecord, FileScan, Maturity, Occurrence, OccurrenceKind, ResolvedVia,
    ScanWarning, Severity, Violation,
};
