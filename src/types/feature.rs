use serde::{Deserialize, Serialize};

use super::occurrence::Occurrence;

/// Which resolution path produced a feature record
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ResolvedVia {
    /// Direct `name -> featureId` table entry
    Direct,
    /// Exact `(name, value)` pair in a value-keyed sub-table
    ValueKeyed,
}

/// An occurrence resolved to a canonical feature identifier.
///
/// One per successfully mapped occurrence; occurrences with no table match
/// produce nothing (absence is not an error).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    pub feature_id: String,
    pub occurrence: Occurrence,
    pub resolved_via: ResolvedVia,
}

impl FeatureRecord {
    pub fn new<S: Into<String>>(feature_id: S, occurrence: Occurrence, resolved_via: ResolvedVia) -> Self {
        Self { feature_id: feature_id.into(), occurrence, resolved_via }
    }
}
