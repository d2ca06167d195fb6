use crate::mapping::{resolve, MapEntry, MappingTables};
use crate::types::{Occurrence, OccurrenceKind, ResolvedVia};

fn property(name: &str, value: &str) -> Occurrence {
    Occurrence::new(OccurrenceKind::Property, name, "styles.css", 1, 3).with_value(value)
}

#[test]
fn value_keyed_match_wins_over_fallback() {
    let tables = MappingTables::builtin();

    let record = resolve(&tables, &property("text-wrap", "balance")).unwrap();
    assert_eq!(record.feature_id, "text-wrap-balance");
    assert_eq!(record.resolved_via, ResolvedVia::ValueKeyed);

    // No value-specific entry -> the property's direct fallback
    let record = resolve(&tables, &property("text-wrap", "stable")).unwrap();
    assert_eq!(record.feature_id, "text-wrap");
    assert_eq!(record.resolved_via, ResolvedVia::Direct);
}

#[test]
fn display_grid_resolves_value_keyed() {
    let tables = MappingTables::builtin();
    let record = resolve(&tables, &property("display", "grid")).unwrap();
    assert_eq!(record.feature_id, "grid");
    assert_eq!(record.resolved_via, ResolvedVia::ValueKeyed);
}

#[test]
fn gap_resolves_direct() {
    let tables = MappingTables::builtin();
    let record = resolve(&tables, &property("gap", "20px")).unwrap();
    assert_eq!(record.feature_id, "flexbox-gap");
    assert_eq!(record.resolved_via, ResolvedVia::Direct);
}

#[test]
fn unmapped_property_and_value_produce_no_record() {
    let tables = MappingTables::builtin();
    assert!(resolve(&tables, &property("color", "red")).is_none());
    // display has a sub-table but no fallback and no entry for 'block'
    assert!(resolve(&tables, &property("display", "block")).is_none());
}

#[test]
fn value_normalization_handles_case_and_important() {
    let tables = MappingTables::builtin();
    let record = resolve(&tables, &property("display", "  GRID !important ")).unwrap();
    assert_eq!(record.feature_id, "grid");
}

#[test]
fn non_property_kinds_use_their_own_tables() {
    let tables = MappingTables::builtin();

    let selector = Occurrence::new(OccurrenceKind::Selector, ":has", "a.css", 2, 1);
    assert_eq!(resolve(&tables, &selector).unwrap().feature_id, "has");

    let at_rule = Occurrence::new(OccurrenceKind::AtRule, "container", "a.css", 3, 1);
    assert_eq!(resolve(&tables, &at_rule).unwrap().feature_id, "container-queries");

    let var_use = Occurrence::new(OccurrenceKind::Value, "var", "a.css", 4, 9).with_value("--brand");
    assert_eq!(resolve(&tables, &var_use).unwrap().feature_id, "custom-properties");

    let api = Occurrence::new(OccurrenceKind::ApiReference, "fetch", "a.js", 5, 1);
    assert_eq!(resolve(&tables, &api).unwrap().feature_id, "fetch");

    let element = Occurrence::new(OccurrenceKind::Element, "dialog", "a.html", 6, 2);
    assert_eq!(resolve(&tables, &element).unwrap().feature_id, "dialog");

    let attribute = Occurrence::new(OccurrenceKind::Attribute, "loading", "a.html", 6, 12);
    assert_eq!(resolve(&tables, &attribute).unwrap().feature_id, "loading-lazy");
}

#[test]
fn api_names_are_case_sensitive() {
    let tables = MappingTables::builtin();
    let wrong_case = Occurrence::new(OccurrenceKind::ApiReference, "Fetch", "a.js", 1, 1);
    assert!(resolve(&tables, &wrong_case).is_none());
}

#[test]
fn yaml_document_round_trips_tagged_entries() {
    let yaml = r#"
properties:
  display:
    values:
      grid: grid
      flex: flexbox
  gap: flexbox-gap
  text-wrap:
    values:
      balance: text-wrap-balance
    fallback: text-wrap
selectors:
  ":has": has
at_rules:
  container: container-queries
"#;
    let tables = MappingTables::from_yaml_str(yaml).unwrap();

    assert!(matches!(tables.properties.get("gap"), Some(MapEntry::Direct(id)) if id == "flexbox-gap"));
    assert!(matches!(
        tables.properties.get("display"),
        Some(MapEntry::ByValue { fallback: None, .. })
    ));

    let record = resolve(&tables, &property("text-wrap", "nowrap")).unwrap();
    assert_eq!(record.feature_id, "text-wrap");
}

#[test]
fn malformed_yaml_is_a_table_load_error() {
    let err = MappingTables::from_yaml_str("properties: [not, a, map]").unwrap_err();
    assert!(err.to_string().contains("mapping table load failed"));
}
