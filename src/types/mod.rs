//! Core data model - occurrences, feature records, violations, reports

mod feature;
mod occurrence;
mod report;
mod violation;

pub use feature::{FeatureRecord, ResolvedVia};
pub use occurrence::{Occurrence, OccurrenceKind};
pub use report::{BatchReport, FileScan, ScanWarning};
pub use violation::{Maturity, Severity, Violation};
