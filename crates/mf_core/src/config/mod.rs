//! Extraction configuration
//!
//! Every team- or competition-specific constant lives here: target team, zone
//! cuts, progressive thresholds, time windows, clock handling and composite
//! weights. Nothing in `analysis` hard-codes these values.
//!
//! ## Usage
//!
//! ```rust
//! use mf_core::config::ExtractionConfig;
//!
//! // Defaults for team 217
//! let config = ExtractionConfig::new(217);
//!
//! // Elapsed time carried across half-time
//! let continuous = ExtractionConfig::continuous_clock(217);
//! assert!(continuous.clock.half_time_continuation);
//!
//! // From environment variable
//! let from_env = ExtractionConfig::from_env_or(217);
//! ```
//!
//! ## Environment Variables
//!
//! - `MF_CLOCK_PROFILE`: Select clock preset (continuous, default)

pub mod composite_config;
pub mod thresholds_config;
pub mod zone_config;

pub use composite_config::{
    ComponentConfig, CompositeIndexConfig, NormalizationStrategy, WEIGHT_SUM_TOLERANCE,
};
pub use thresholds_config::{
    BypassWindowConfig, ClockConfig, ProgressiveConfig, RiskThresholds, WindowConfig,
};
pub use zone_config::ZoneConfig;

use serde::{Deserialize, Serialize};
use std::env;

use crate::analysis::possession::SegmentationMode;
use crate::error::{ExtractError, Result};
use crate::models::TeamId;

/// Full configuration of one extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Team whose defending is measured ("us")
    pub target_team: TeamId,
    #[serde(default)]
    pub segmentation: SegmentationMode,
    #[serde(default)]
    pub zones: ZoneConfig,
    #[serde(default)]
    pub progressive: ProgressiveConfig,
    #[serde(default)]
    pub windows: WindowConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub bypass: BypassWindowConfig,
    #[serde(default = "CompositeIndexConfig::defaults")]
    pub composites: Vec<CompositeIndexConfig>,
    #[serde(default)]
    pub risk: RiskThresholds,
}

impl ExtractionConfig {
    pub fn new(target_team: TeamId) -> Self {
        Self {
            target_team,
            segmentation: SegmentationMode::default(),
            zones: ZoneConfig::default(),
            progressive: ProgressiveConfig::default(),
            windows: WindowConfig::default(),
            clock: ClockConfig::default(),
            bypass: BypassWindowConfig::default(),
            composites: CompositeIndexConfig::defaults(),
            risk: RiskThresholds::default(),
        }
    }

    /// Elapsed time continues across half-time.
    pub fn continuous_clock(target_team: TeamId) -> Self {
        Self {
            clock: ClockConfig::continuous(),
            ..Self::new(target_team)
        }
    }

    pub fn from_env_or(target_team: TeamId) -> Self {
        match env::var("MF_CLOCK_PROFILE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "continuous" => Self::continuous_clock(target_team),
            _ => Self::new(target_team),
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.zones.validate()?;
        self.progressive.validate()?;
        self.windows.validate()?;
        self.clock.validate()?;
        self.bypass.validate()?;

        let mut names = std::collections::BTreeSet::new();
        for index in &self.composites {
            if !names.insert(index.name.as_str()) {
                return Err(ExtractError::InvalidConfig(format!(
                    "composite index '{}' defined twice",
                    index.name
                )));
            }
            index.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::zones::Third;

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractionConfig::new(1).validate().is_ok());
        let continuous = ExtractionConfig::continuous_clock(1);
        assert!(continuous.validate().is_ok());
        assert!(continuous.clock.half_time_continuation);
    }

    #[test]
    fn test_yaml_minimal_uses_defaults() {
        let config = ExtractionConfig::from_yaml_str("target_team: 217\n").unwrap();
        assert_eq!(config.target_team, 217);
        assert_eq!(config.zones.target_band, Third::Midfield);
        assert_eq!(config.composites.len(), 2);
        assert!(!config.clock.half_time_continuation);
    }

    #[test]
    fn test_yaml_partial_section_override() {
        let yaml = r#"
target_team: 5
zones:
  central_y_min: 30.0
  central_y_max: 50.0
progressive:
  min_forward_gain: 10.0
"#;
        let config = ExtractionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.zones.central_y_min, 30.0);
        assert_eq!(config.zones.defensive_x_max, 40.0);
        assert_eq!(config.progressive.min_forward_gain, 10.0);
        assert_eq!(config.progressive.min_length, 10.0);
    }

    #[test]
    fn test_yaml_missing_team_is_parse_error() {
        let err = ExtractionConfig::from_yaml_str("zones: {}\n").unwrap_err();
        assert!(matches!(err, ExtractError::ConfigParse(_)));
    }

    #[test]
    fn test_yaml_bad_weights_fail_at_load() {
        let yaml = r#"
target_team: 5
composites:
  - name: custom
    components:
      - feature: pressured_share
        weight: 0.6
        normalization: { kind: proportion }
      - feature: bypass_prevention_rate
        weight: 0.6
        normalization: { kind: proportion }
"#;
        let err = ExtractionConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidWeightConfig { .. }));
    }

    #[test]
    fn test_duplicate_index_names_rejected() {
        let mut config = ExtractionConfig::new(1);
        config
            .composites
            .push(CompositeIndexConfig::bypass_risk_score());
        assert!(matches!(
            config.validate(),
            Err(ExtractError::InvalidConfig(_))
        ));
    }
}
