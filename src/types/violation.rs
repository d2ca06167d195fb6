use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Baseline maturity - how long a feature has been interoperable.
/// Ordered from least to most mature so thresholds can compare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Maturity {
    /// Not yet interoperable across core browsers
    Limited,
    /// Recently became interoperable
    Newly,
    /// Interoperable long enough to rely on
    Widely,
}

impl Maturity {
    pub fn slug(self) -> &'static str {
        match self {
            Self::Limited => "limited",
            Self::Newly => "newly",
            Self::Widely => "widely",
        }
    }

    pub const ALL: [Maturity; 3] = [Maturity::Limited, Maturity::Newly, Maturity::Widely];
}

impl fmt::Display for Maturity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Maturity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "limited" => Ok(Self::Limited),
            "newly" => Ok(Self::Newly),
            "widely" => Ok(Self::Widely),
            other => Err(format!("unknown maturity '{other}' (expected limited, newly, or widely)")),
        }
    }
}

/// Severity assigned to a violation by policy.
/// `Allow` suppresses the violation entirely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Allow,
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn slug(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Self::Allow),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown severity '{other}' (expected allow, info, warn, or error)")),
        }
    }
}

/// A policy-evaluated feature record whose maturity fails the configured
/// threshold. Derived from exactly one `FeatureRecord`, never mutated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Violation {
    pub feature_id: String,
    pub feature_name: String,
    pub maturity: Maturity,
    pub severity: Severity,
    pub file: String,
    pub line: u32,
    pub column: u32,
    /// Stable per maturity class (`baseline/limited`, ...) so SARIF
    /// consumers see a bounded rule set
    pub rule_id: String,
    pub guidance: String,
}

impl Violation {
    /// Sort key giving deterministic output independent of scan scheduling
    pub fn sort_key(&self) -> (&str, u32, u32, &str, &str) {
        (&self.file, self.line, self.column, &self.rule_id, &self.feature_id)
    }
}
