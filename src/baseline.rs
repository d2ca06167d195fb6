//! Baseline dataset - the externally supplied feature maturity map.
//!
//! Loaded once before any policy evaluation and treated as immutable for
//! the run's duration. The core performs no fetching itself; refresh goes
//! through a caller-supplied loader, optionally wrapped by the resilience
//! layer (see [`BaselineDataset::load_with`]).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScanError};
use crate::resilience::{retry, CircuitBreaker, RetryPolicy};
use crate::types::Maturity;

/// Maturity and validity dates for one feature
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FeatureStatus {
    /// Human-readable feature name, when the dataset carries one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    pub maturity: Maturity,
    /// Date the feature became newly available
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub low_date: Option<String>,
    /// Date the feature became widely available
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub high_date: Option<String>,
}

/// Read-only map of canonical feature id to Baseline status
#[derive(Debug, Clone, Default)]
pub struct BaselineDataset {
    features: FxHashMap<String, FeatureStatus>,
}

impl BaselineDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Test/builder convenience: insert one feature with just a maturity
    pub fn with_feature<S: Into<String>>(mut self, feature_id: S, maturity: Maturity) -> Self {
        self.features.insert(
            feature_id.into(),
            FeatureStatus { name: None, maturity, low_date: None, high_date: None },
        );
        self
    }

    pub fn with_status<S: Into<String>>(mut self, feature_id: S, status: FeatureStatus) -> Self {
        self.features.insert(feature_id.into(), status);
        self
    }

    /// Parse the dataset from its JSON document form:
    /// `{"<featureId>": {"maturity": "widely", ...}, ...}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let features: FxHashMap<String, FeatureStatus> = serde_json::from_str(json)
            .map_err(|e| ScanError::dataset_load(format!("failed to parse dataset JSON: {e}")))?;
        debug!(features = features.len(), "baseline dataset parsed");
        Ok(Self { features })
    }

    /// Refresh through a fallible loader, composing the resilience layer:
    /// the circuit breaker (when given) wraps the whole retried sequence,
    /// so a persistently failing upstream fails fast on later refreshes.
    pub fn load_with<F>(
        loader: F,
        policy: &RetryPolicy,
        breaker: Option<&CircuitBreaker>,
    ) -> Result<Self>
    where
        F: FnMut() -> Result<String>,
    {
        let fetch = |mut loader: F| -> Result<Self> {
            let body = retry(policy, ScanError::is_transient, |attempt| {
                debug!(attempt, "loading baseline dataset");
                loader()
            })?;
            Self::from_json_str(&body)
        };

        let dataset = match breaker {
            Some(breaker) => breaker.call(|| fetch(loader))?,
            None => fetch(loader)?,
        };
        info!(features = dataset.len(), "baseline dataset loaded");
        Ok(dataset)
    }

    pub fn status(&self, feature_id: &str) -> Option<&FeatureStatus> {
        self.features.get(feature_id)
    }

    /// Maturity for a feature. An unknown feature id is treated as the
    /// least mature category - never a silent pass.
    pub fn maturity(&self, feature_id: &str) -> Maturity {
        self.features.get(feature_id).map(|s| s.maturity).unwrap_or(Maturity::Limited)
    }

    /// Display name for a feature, falling back to its id
    pub fn feature_name<'a>(&'a self, feature_id: &'a str) -> &'a str {
        self.features
            .get(feature_id)
            .and_then(|s| s.name.as_deref())
            .unwrap_or(feature_id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
