//! Pitch zone boundaries
//!
//! | Band | Rule (defaults) |
//! |------|-----------------|
//! | Defensive third | x < 40 |
//! | Midfield third | 40 <= x <= 80 |
//! | Final third | x > 80 |
//! | Central lane | 35 <= y <= 45 |
//! | Left / right lane | y below / above the lateral split (40), outside the central lane |

use serde::{Deserialize, Serialize};

use crate::analysis::zones::Third;
use crate::error::{ExtractError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Pitch length (x extent)
    pub pitch_length: f64,
    /// Pitch width (y extent)
    pub pitch_width: f64,
    /// Upper bound (exclusive) of the defensive third
    pub defensive_x_max: f64,
    /// Lower bound (exclusive) of the final third
    pub final_x_min: f64,
    /// Central lane lower bound (inclusive)
    pub central_y_min: f64,
    /// Central lane upper bound (inclusive)
    pub central_y_max: f64,
    /// Left/right split for locations outside the central lane
    pub lateral_split_y: f64,
    /// Band whose access is being controlled
    pub target_band: Third,
    /// Half width of the entry/exit band used for prevention rates
    pub entry_band_half_width: f64,
    /// Coverage grid resolution (cells per axis) over the target band
    pub coverage_grid_cells: usize,
    /// Fraction of the mean cell count below which a cell is a coverage gap
    pub coverage_gap_fraction: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            pitch_length: 120.0,
            pitch_width: 80.0,
            defensive_x_max: 40.0,
            final_x_min: 80.0,
            central_y_min: 35.0,
            central_y_max: 45.0,
            lateral_split_y: 40.0,
            target_band: Third::Midfield,
            entry_band_half_width: 2.0,
            coverage_grid_cells: 3,
            coverage_gap_fraction: 0.05,
        }
    }
}

impl ZoneConfig {
    /// Inclusive x range of a band.
    pub fn band_range(&self, band: Third) -> (f64, f64) {
        match band {
            Third::Defensive => (0.0, self.defensive_x_max),
            Third::Midfield => (self.defensive_x_max, self.final_x_min),
            Third::Final => (self.final_x_min, self.pitch_length),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.pitch_length > 0.0 && self.pitch_width > 0.0) {
            return Err(ExtractError::InvalidConfig(
                "pitch dimensions must be positive".to_string(),
            ));
        }
        if !(0.0 < self.defensive_x_max
            && self.defensive_x_max < self.final_x_min
            && self.final_x_min < self.pitch_length)
        {
            return Err(ExtractError::InvalidConfig(format!(
                "x cuts must satisfy 0 < {} < {} < {}",
                self.defensive_x_max, self.final_x_min, self.pitch_length
            )));
        }
        if !(0.0 < self.central_y_min
            && self.central_y_min <= self.central_y_max
            && self.central_y_max < self.pitch_width)
        {
            return Err(ExtractError::InvalidConfig(format!(
                "central lane [{}, {}] must lie inside (0, {})",
                self.central_y_min, self.central_y_max, self.pitch_width
            )));
        }
        if !(self.central_y_min <= self.lateral_split_y && self.lateral_split_y <= self.central_y_max)
        {
            return Err(ExtractError::InvalidConfig(format!(
                "lateral split {} must lie inside the central lane",
                self.lateral_split_y
            )));
        }
        if self.entry_band_half_width < 0.0 || self.coverage_grid_cells == 0 {
            return Err(ExtractError::InvalidConfig(
                "entry band and coverage grid must be non-negative / non-empty".to_string(),
            ));
        }
        Ok(())
    }
}
