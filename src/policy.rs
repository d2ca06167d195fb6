//! Maturity policy - configuration validation and the pure evaluator.
//!
//! Invalid configuration is rejected before any scanning begins, and
//! validation enumerates every schema violation found rather than stopping
//! at the first. Evaluation is a pure function of its three inputs so CI
//! systems can cache and diff results reliably.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::baseline::BaselineDataset;
use crate::error::{Result, ScanError};
use crate::types::{FeatureRecord, Maturity, Severity, Violation};

/// How severities are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementMode {
    /// Per-feature overrides apply, falling back to maturity thresholds
    PerFeature,
    /// Maturity thresholds only; overrides are ignored
    GlobalThreshold,
}

/// Severity for each maturity class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityThresholds {
    pub limited: Severity,
    pub newly: Severity,
    pub widely: Severity,
}

impl SeverityThresholds {
    pub fn for_maturity(&self, maturity: Maturity) -> Severity {
        match maturity {
            Maturity::Limited => self.limited,
            Maturity::Newly => self.newly,
            Maturity::Widely => self.widely,
        }
    }
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self { limited: Severity::Error, newly: Severity::Warn, widely: Severity::Allow }
    }
}

/// Validated policy configuration. Construct via [`RawPolicyConfig::validate`]
/// or start from `Default` and adjust typed fields.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub enforcement_mode: EnforcementMode,
    pub per_feature_overrides: FxHashMap<String, Severity>,
    pub severity_thresholds: SeverityThresholds,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            enforcement_mode: EnforcementMode::GlobalThreshold,
            per_feature_overrides: FxHashMap::default(),
            severity_thresholds: SeverityThresholds::default(),
        }
    }
}

impl PolicyConfig {
    /// Severity for one feature at one maturity, per the enforcement mode
    pub fn severity_for(&self, feature_id: &str, maturity: Maturity) -> Severity {
        if self.enforcement_mode == EnforcementMode::PerFeature {
            if let Some(severity) = self.per_feature_overrides.get(feature_id) {
                return *severity;
            }
        }
        self.severity_thresholds.for_maturity(maturity)
    }
}

/// Policy configuration as deserialized from an external document, before
/// validation. All fields are stringly typed on purpose: `validate` turns
/// them into [`PolicyConfig`] and reports every schema violation at once.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPolicyConfig {
    #[serde(default = "default_mode")]
    pub enforcement_mode: String,
    #[serde(default)]
    pub per_feature_overrides: BTreeMap<String, String>,
    #[serde(default = "default_thresholds")]
    pub severity_thresholds: BTreeMap<String, String>,
}

fn default_mode() -> String {
    "global-threshold".to_string()
}

fn default_thresholds() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("limited".to_string(), "error".to_string()),
        ("newly".to_string(), "warn".to_string()),
        ("widely".to_string(), "allow".to_string()),
    ])
}

impl Default for RawPolicyConfig {
    fn default() -> Self {
        Self {
            enforcement_mode: default_mode(),
            per_feature_overrides: BTreeMap::new(),
            severity_thresholds: default_thresholds(),
        }
    }
}

impl RawPolicyConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ScanError::policy_config(vec![format!("failed to parse policy YAML: {e}")]))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ScanError::policy_config(vec![format!("failed to parse policy JSON: {e}")]))
    }

    /// Validate into a typed [`PolicyConfig`], enumerating every schema
    /// violation found - not just the first.
    pub fn validate(&self) -> Result<PolicyConfig> {
        let mut violations = Vec::new();

        let enforcement_mode = match self.enforcement_mode.as_str() {
            "per-feature" => EnforcementMode::PerFeature,
            "global-threshold" => EnforcementMode::GlobalThreshold,
            other => {
                violations.push(format!(
                    "unknown enforcement mode '{other}' (expected per-feature or global-threshold)"
                ));
                EnforcementMode::GlobalThreshold
            }
        };

        let mut per_feature_overrides = FxHashMap::default();
        for (feature_id, severity) in &self.per_feature_overrides {
            if feature_id.trim().is_empty() {
                violations.push("per-feature override with empty feature id".to_string());
                continue;
            }
            match severity.parse::<Severity>() {
                Ok(severity) => {
                    per_feature_overrides.insert(feature_id.clone(), severity);
                }
                Err(detail) => {
                    violations.push(format!("override for '{feature_id}': {detail}"));
                }
            }
        }

        let mut thresholds = SeverityThresholds::default();
        for (maturity, severity) in &self.severity_thresholds {
            let maturity = match maturity.parse::<Maturity>() {
                Ok(m) => m,
                Err(detail) => {
                    violations.push(format!("severity threshold: {detail}"));
                    continue;
                }
            };
            match severity.parse::<Severity>() {
                Ok(severity) => match maturity {
                    Maturity::Limited => thresholds.limited = severity,
                    Maturity::Newly => thresholds.newly = severity,
                    Maturity::Widely => thresholds.widely = severity,
                },
                Err(detail) => {
                    violations.push(format!("severity threshold for '{maturity}': {detail}"));
                }
            }
        }
        for maturity in Maturity::ALL {
            if !self.severity_thresholds.contains_key(maturity.slug()) {
                violations.push(format!("severity threshold for '{maturity}' is missing"));
            }
        }

        if violations.is_empty() {
            Ok(PolicyConfig { enforcement_mode, per_feature_overrides, severity_thresholds: thresholds })
        } else {
            Err(ScanError::policy_config(violations))
        }
    }
}

/// Evaluate one resolved feature against the policy.
///
/// Pure and deterministic: identical inputs always produce the identical
/// result, independent of call order or prior calls. An unknown feature id
/// is treated as the least mature category.
pub fn evaluate(
    record: &FeatureRecord,
    config: &PolicyConfig,
    dataset: &BaselineDataset,
) -> Option<Violation> {
    let maturity = dataset.maturity(&record.feature_id);
    let severity = config.severity_for(&record.feature_id, maturity);
    if severity == Severity::Allow {
        return None;
    }

    let feature_name = dataset.feature_name(&record.feature_id).to_string();
    let guidance = guidance_for(&feature_name, maturity, dataset.status(&record.feature_id));
    Some(Violation {
        feature_id: record.feature_id.clone(),
        feature_name,
        maturity,
        severity,
        file: record.occurrence.file.clone(),
        line: record.occurrence.line,
        column: record.occurrence.column,
        rule_id: format!("baseline/{}", maturity.slug()),
        guidance,
    })
}

fn guidance_for(
    feature_name: &str,
    maturity: Maturity,
    status: Option<&crate::baseline::FeatureStatus>,
) -> String {
    match maturity {
        Maturity::Limited => format!(
            "'{feature_name}' has limited Baseline availability; gate it behind a feature check or provide a fallback"
        ),
        Maturity::Newly => match status.and_then(|s| s.low_date.as_deref()) {
            Some(date) => format!(
                "'{feature_name}' is newly interoperable (since {date}); confirm it meets your support target"
            ),
            None => format!(
                "'{feature_name}' is newly interoperable; confirm it meets your support target"
            ),
        },
        Maturity::Widely => {
            format!("'{feature_name}' is widely available but flagged by policy")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Occurrence, OccurrenceKind, ResolvedVia};

    fn record(feature: &str) -> FeatureRecord {
        FeatureRecord::new(
            feature,
            Occurrence::new(OccurrenceKind::Property, "display", "a.css", 4, 9),
            ResolvedVia::ValueKeyed,
        )
    }

    fn dataset() -> BaselineDataset {
        BaselineDataset::empty()
            .with_feature("grid", Maturity::Widely)
            .with_feature("has", Maturity::Newly)
            .with_feature("anchor-positioning", Maturity::Limited)
    }

    #[test]
    fn widely_features_pass_under_default_thresholds() {
        let config = PolicyConfig::default();
        assert!(evaluate(&record("grid"), &config, &dataset()).is_none());
    }

    #[test]
    fn newly_features_warn_and_limited_features_error() {
        let config = PolicyConfig::default();

        let newly = evaluate(&record("has"), &config, &dataset()).unwrap();
        assert_eq!(newly.severity, Severity::Warn);
        assert_eq!(newly.rule_id, "baseline/newly");

        let limited = evaluate(&record("anchor-positioning"), &config, &dataset()).unwrap();
        assert_eq!(limited.severity, Severity::Error);
        assert_eq!(limited.rule_id, "baseline/limited");
        assert_eq!((limited.file.as_str(), limited.line, limited.column), ("a.css", 4, 9));
    }

    #[test]
    fn unknown_feature_is_treated_as_limited_never_passes_silently() {
        let config = PolicyConfig::default();
        let violation = evaluate(&record("brand-new-thing"), &config, &dataset()).unwrap();
        assert_eq!(violation.maturity, Maturity::Limited);
        assert_eq!(violation.severity, Severity::Error);
    }

    #[test]
    fn per_feature_override_applies_only_in_per_feature_mode() {
        let mut config = PolicyConfig::default();
        config.per_feature_overrides.insert("has".to_string(), Severity::Allow);

        // ignored in global-threshold mode
        assert!(evaluate(&record("has"), &config, &dataset()).is_some());

        config.enforcement_mode = EnforcementMode::PerFeature;
        assert!(evaluate(&record("has"), &config, &dataset()).is_none());
    }

    #[test]
    fn override_can_raise_severity_for_a_widely_feature() {
        let mut config = PolicyConfig::default();
        config.enforcement_mode = EnforcementMode::PerFeature;
        config.per_feature_overrides.insert("grid".to_string(), Severity::Error);

        let violation = evaluate(&record("grid"), &config, &dataset()).unwrap();
        assert_eq!(violation.severity, Severity::Error);
        assert_eq!(violation.maturity, Maturity::Widely);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let config = PolicyConfig::default();
        let data = dataset();
        let first = evaluate(&record("has"), &config, &data);
        for _ in 0..10 {
            assert_eq!(evaluate(&record("has"), &config, &data), first);
        }
    }

    #[test]
    fn raw_config_validates_into_typed_config() {
        let raw = RawPolicyConfig::from_yaml_str(
            r#"
enforcement_mode: per-feature
per_feature_overrides:
  grid: allow
  anchor-positioning: error
severity_thresholds:
  limited: error
  newly: info
  widely: allow
"#,
        )
        .unwrap();
        let config = raw.validate().unwrap();
        assert_eq!(config.enforcement_mode, EnforcementMode::PerFeature);
        assert_eq!(config.severity_thresholds.newly, Severity::Info);
        assert_eq!(config.per_feature_overrides.get("grid"), Some(&Severity::Allow));
    }

    #[test]
    fn validation_enumerates_every_violation() {
        let raw = RawPolicyConfig {
            enforcement_mode: "strictest".to_string(),
            per_feature_overrides: BTreeMap::from([
                ("grid".to_string(), "fatal".to_string()),
                ("  ".to_string(), "warn".to_string()),
            ]),
            severity_thresholds: BTreeMap::from([
                ("limited".to_string(), "error".to_string()),
                ("medium".to_string(), "warn".to_string()),
            ]),
        };
        let err = raw.validate().unwrap_err();
        let ScanError::PolicyConfig { violations } = &err else {
            panic!("expected PolicyConfig error, got {err}");
        };
        // bad mode, bad override severity, empty feature id, unknown
        // maturity key, and two missing thresholds (newly, widely)
        assert_eq!(violations.len(), 6);
    }

    #[test]
    fn default_raw_config_is_valid() {
        let config = RawPolicyConfig::default().validate().unwrap();
        assert_eq!(config.enforcement_mode, EnforcementMode::GlobalThreshold);

        // the serde path fills the same defaults for omitted fields
        let config = RawPolicyConfig::from_yaml_str("{}").unwrap().validate().unwrap();
        assert_eq!(config.enforcement_mode, EnforcementMode::GlobalThreshold);
        assert_eq!(config.severity_thresholds.limited, Severity::Error);
    }
}
