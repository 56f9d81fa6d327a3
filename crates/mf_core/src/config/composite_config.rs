//! Composite index definitions
//!
//! An index is a weighted sum of normalized feature values. Definitions are
//! plain data so they can be loaded from YAML; the weights are validated
//! before any scoring runs.

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// Tolerance on the weight sum.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// How a raw feature value is mapped into [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizationStrategy {
    /// Already a proportion; clamped into [0, 1].
    Proportion,
    /// Linear rescale against fixed bounds, clamped.
    MinMax { min: f64, max: f64 },
    /// Linear rescale against the extremes of a reference distribution.
    Reference { values: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub feature: String,
    pub weight: f64,
    pub normalization: NormalizationStrategy,
    /// Use `1 - normalized` (lower raw value is better).
    #[serde(default)]
    pub invert: bool,
    /// Normalized value substituted when the input is undefined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
}

impl ComponentConfig {
    pub fn new(feature: &str, weight: f64, normalization: NormalizationStrategy) -> Self {
        Self {
            feature: feature.to_string(),
            weight,
            normalization,
            invert: false,
            default: None,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeIndexConfig {
    pub name: String,
    pub components: Vec<ComponentConfig>,
}

impl CompositeIndexConfig {
    /// Midfield access control.
    pub fn access_control_index() -> Self {
        Self {
            name: "access_control_index".to_string(),
            components: vec![
                ComponentConfig::new(
                    "interceptions_per_opp_possession",
                    0.25,
                    NormalizationStrategy::MinMax { min: 0.0, max: 1.0 },
                ),
                ComponentConfig::new(
                    "recoveries_per_minute",
                    0.25,
                    NormalizationStrategy::MinMax { min: 0.0, max: 5.0 },
                ),
                ComponentConfig::new("pressured_share", 0.20, NormalizationStrategy::Proportion),
                ComponentConfig::new(
                    "bypass_prevention_rate",
                    0.20,
                    NormalizationStrategy::Proportion,
                ),
                ComponentConfig::new(
                    "compactness_index",
                    0.10,
                    NormalizationStrategy::MinMax { min: 0.0, max: 2.0 },
                )
                .inverted(),
            ],
        }
    }

    pub fn bypass_risk_score() -> Self {
        Self {
            name: "bypass_risk_score".to_string(),
            components: vec![ComponentConfig::new(
                "dangerous_actions_per_opp_possession",
                1.0,
                NormalizationStrategy::MinMax { min: 0.0, max: 10.0 },
            )],
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![Self::access_control_index(), Self::bypass_risk_score()]
    }

    /// Weights non-negative and summing to 1 within tolerance.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ExtractError::InvalidWeightConfig {
            index: self.name.clone(),
            reason,
        };

        if self.components.is_empty() {
            return Err(invalid("no components".to_string()));
        }
        for c in &self.components {
            if !(c.weight >= 0.0 && c.weight.is_finite()) {
                return Err(invalid(format!("weight of '{}' is {}", c.feature, c.weight)));
            }
            if let Some(d) = c.default {
                if !(0.0..=1.0).contains(&d) {
                    return Err(invalid(format!(
                        "default of '{}' must be in [0, 1], got {}",
                        c.feature, d
                    )));
                }
            }
            match &c.normalization {
                NormalizationStrategy::MinMax { min, max } if min > max => {
                    return Err(invalid(format!(
                        "min-max bounds of '{}' are inverted ({} > {})",
                        c.feature, min, max
                    )));
                }
                NormalizationStrategy::Reference { values } if values.is_empty() => {
                    return Err(invalid(format!(
                        "reference distribution of '{}' is empty",
                        c.feature
                    )));
                }
                _ => {}
            }
        }
        let sum: f64 = self.components.iter().map(|c| c.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!("weights sum to {}", sum)));
        }
        Ok(())
    }
}
