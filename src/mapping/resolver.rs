use tracing::trace;

use crate::types::{FeatureRecord, Occurrence, OccurrenceKind, ResolvedVia};

use super::tables::{MapEntry, MappingTables};

/// Resolve an occurrence to zero or one canonical feature identifier.
///
/// Resolution order for properties, from most to least specific: exact
/// `(name, value)` pair in the value-keyed sub-table, then the direct
/// mapping for the name alone. A value-keyed match wins over a direct
/// mapping when both exist. Every other occurrence kind is a direct-only
/// lookup in its kind's table. No match means no record.
pub fn resolve(tables: &MappingTables, occurrence: &Occurrence) -> Option<FeatureRecord> {
    match occurrence.kind {
        OccurrenceKind::Property => resolve_property(tables, occurrence),
        OccurrenceKind::Value | OccurrenceKind::Function => {
            direct(&tables.functions, &occurrence.name.to_ascii_lowercase(), occurrence)
        }
        OccurrenceKind::Selector => {
            direct(&tables.selectors, &occurrence.name.to_ascii_lowercase(), occurrence)
        }
        OccurrenceKind::AtRule => {
            direct(&tables.at_rules, &occurrence.name.to_ascii_lowercase(), occurrence)
        }
        OccurrenceKind::ApiReference | OccurrenceKind::Syntax => {
            direct(&tables.api_names, &occurrence.name, occurrence)
        }
        OccurrenceKind::Element => {
            direct(&tables.elements, &occurrence.name.to_ascii_lowercase(), occurrence)
        }
        OccurrenceKind::Attribute => {
            direct(&tables.attributes, &occurrence.name.to_ascii_lowercase(), occurrence)
        }
    }
}

fn resolve_property(tables: &MappingTables, occurrence: &Occurrence) -> Option<FeatureRecord> {
    let name = occurrence.name.to_ascii_lowercase();
    match tables.properties.get(&name)? {
        MapEntry::Direct(id) => {
            Some(FeatureRecord::new(id.clone(), occurrence.clone(), ResolvedVia::Direct))
        }
        MapEntry::ByValue { values, fallback } => {
            if let Some(value) = occurrence.associated_value.as_deref().map(normalize_value) {
                if let Some(id) = values.get(&value) {
                    trace!(property = %name, value = %value, feature = %id, "value-keyed match");
                    return Some(FeatureRecord::new(
                        id.clone(),
                        occurrence.clone(),
                        ResolvedVia::ValueKeyed,
                    ));
                }
            }
            fallback
                .as_ref()
                .map(|id| FeatureRecord::new(id.clone(), occurrence.clone(), ResolvedVia::Direct))
        }
    }
}

fn direct(
    table: &rustc_hash::FxHashMap<String, String>,
    name: &str,
    occurrence: &Occurrence,
) -> Option<FeatureRecord> {
    table
        .get(name)
        .map(|id| FeatureRecord::new(id.clone(), occurrence.clone(), ResolvedVia::Direct))
}

/// Lowercase, trim, and strip `!important` so `GRID` and
/// `grid !important` both key the same sub-table entry
fn normalize_value(value: &str) -> String {
    let lowered = value.trim().to_ascii_lowercase();
    lowered.trim_end_matches("!important").trim().to_string()
}
