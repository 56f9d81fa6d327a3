//! # Composite Scorer
//!
//! Post-processing over computed feature values: each component is mapped
//! into [0, 1] and the index is the weighted sum.
//!
//! ## Normalization
//!
//! | Strategy | Mapping |
//! |----------|---------|
//! | Proportion | clamp into [0, 1] (logged when clamping was needed) |
//! | MinMax | `(v - min) / (max - min)`, clamped; `0.5` when `max == min` |
//! | Reference | MinMax against the extremes of the reference values |
//!
//! An undefined input makes the index undefined unless the component
//! declares a `default` (already on the normalized scale).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::config::{CompositeIndexConfig, NormalizationStrategy, RiskThresholds};
use crate::error::Result;
use crate::models::{FeatureRecord, FeatureValue};

fn min_max(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.5;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Map a raw value into [0, 1].
pub fn normalize(feature: &str, value: f64, strategy: &NormalizationStrategy) -> f64 {
    match strategy {
        NormalizationStrategy::Proportion => {
            if !(0.0..=1.0).contains(&value) {
                warn!(feature, value, "proportion outside [0, 1]; clamping");
            }
            value.clamp(0.0, 1.0)
        }
        NormalizationStrategy::MinMax { min, max } => min_max(value, *min, *max),
        NormalizationStrategy::Reference { values } => {
            let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if lo.is_finite() && hi.is_finite() {
                min_max(value, lo, hi)
            } else {
                0.5
            }
        }
    }
}

/// Validated set of composite indices.
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    indices: Vec<CompositeIndexConfig>,
}

impl CompositeScorer {
    /// Fails with `InvalidWeightConfig` before any scoring can run.
    pub fn new(indices: Vec<CompositeIndexConfig>) -> Result<Self> {
        for index in &indices {
            index.validate()?;
        }
        Ok(Self { indices })
    }

    pub fn indices(&self) -> &[CompositeIndexConfig] {
        &self.indices
    }

    pub fn score(
        index: &CompositeIndexConfig,
        values: &BTreeMap<String, FeatureValue>,
    ) -> FeatureValue {
        let mut total = 0.0;
        for component in &index.components {
            let raw = values
                .get(&component.feature)
                .copied()
                .unwrap_or(FeatureValue::Undefined);
            let normalized = match (raw, component.default) {
                (FeatureValue::Value(v), _) => {
                    let n = normalize(&component.feature, v, &component.normalization);
                    if component.invert {
                        1.0 - n
                    } else {
                        n
                    }
                }
                (FeatureValue::Undefined, Some(default)) => default,
                (FeatureValue::Undefined, None) => return FeatureValue::Undefined,
            };
            total += component.weight * normalized;
        }
        FeatureValue::from_f64(total.clamp(0.0, 1.0))
    }

    /// Every index over one record's values, by index name.
    pub fn score_record(&self, record: &FeatureRecord) -> Vec<(String, FeatureValue)> {
        self.indices
            .iter()
            .map(|index| (index.name.clone(), Self::score(index, &record.values)))
            .collect()
    }
}

/// Match-level warning flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    HighProgressivePasses,
    HighThroughBalls,
    HighCarriesThroughRegion,
    LowBypassPrevention,
}

impl RiskFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactor::HighProgressivePasses => "high_progressive_passes",
            RiskFactor::HighThroughBalls => "high_through_balls",
            RiskFactor::HighCarriesThroughRegion => "high_carries_through_region",
            RiskFactor::LowBypassPrevention => "low_bypass_prevention",
        }
    }
}

/// Flags raised by a record; undefined inputs never raise a flag.
pub fn risk_factors(record: &FeatureRecord, thresholds: &RiskThresholds) -> Vec<RiskFactor> {
    let above = |name: &str, cut: f64| record.get(name).as_option().is_some_and(|v| v > cut);
    let below = |name: &str, cut: f64| record.get(name).as_option().is_some_and(|v| v < cut);

    let mut flags = Vec::new();
    if above("progressive_passes_allowed", thresholds.progressive_passes) {
        flags.push(RiskFactor::HighProgressivePasses);
    }
    if above("through_balls_allowed", thresholds.through_balls) {
        flags.push(RiskFactor::HighThroughBalls);
    }
    if above("carries_through_region", thresholds.carries_through_region) {
        flags.push(RiskFactor::HighCarriesThroughRegion);
    }
    if below("bypass_prevention_rate", thresholds.min_bypass_prevention) {
        flags.push(RiskFactor::LowBypassPrevention);
    }
    flags
}
