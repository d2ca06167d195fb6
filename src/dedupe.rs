//! Per-file deduplication of resolved feature records.

use rustc_hash::FxHashSet;

use crate::types::FeatureRecord;

/// Drop later records whose `(feature_id, line, column)` matches an earlier
/// one; the first occurrence wins and order is preserved. Operates per
/// file - records from different files are never compared.
pub fn dedupe_records(records: Vec<FeatureRecord>) -> Vec<FeatureRecord> {
    let mut seen: FxHashSet<(String, u32, u32)> = FxHashSet::default();
    records
        .into_iter()
        .filter(|record| {
            seen.insert((
                record.feature_id.clone(),
                record.occurrence.line,
                record.occurrence.column,
            ))
        })
        .collect()
}
