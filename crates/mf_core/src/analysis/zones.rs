//! # Zone Classification
//!
//! Maps a pitch location to one of nine cells (three x-bands by three
//! y-lanes) or to the coarser x-only third. Boundaries come from
//! [`ZoneConfig`]; nothing here assumes a pitch convention.
//!
//! Locations outside `[0, length] x [0, width]` are rejected with
//! [`ExtractError::OutOfRange`] rather than clamped.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ZoneConfig;
use crate::error::{ExtractError, Result};
use crate::models::Location;

/// x-band
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Third {
    Defensive,
    Midfield,
    Final,
}

impl Third {
    pub const ALL: [Third; 3] = [Third::Defensive, Third::Midfield, Third::Final];

    pub fn as_str(&self) -> &'static str {
        match self {
            Third::Defensive => "defensive",
            Third::Midfield => "midfield",
            Third::Final => "final",
        }
    }
}

/// y-band
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Left,
    Central,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Central, Lane::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Left => "left",
            Lane::Central => "central",
            Lane::Right => "right",
        }
    }

    pub fn is_wide(&self) -> bool {
        !matches!(self, Lane::Central)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct ZoneLabel {
    pub third: Third,
    pub lane: Lane,
}

impl ZoneLabel {
    pub fn all() -> impl Iterator<Item = ZoneLabel> {
        Third::ALL
            .into_iter()
            .flat_map(|third| Lane::ALL.into_iter().map(move |lane| ZoneLabel { third, lane }))
    }

    /// Record key, e.g. `midfield_central`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.third.as_str(), self.lane.as_str())
    }
}

impl fmt::Display for ZoneLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.third.as_str(), self.lane.as_str())
    }
}

/// Pure location classifier.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    config: ZoneConfig,
}

impl ZoneClassifier {
    pub fn new(config: ZoneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    fn check(&self, x: f64, y: f64) -> Result<()> {
        let in_x = (0.0..=self.config.pitch_length).contains(&x);
        let in_y = (0.0..=self.config.pitch_width).contains(&y);
        if in_x && in_y {
            Ok(())
        } else {
            Err(ExtractError::OutOfRange {
                x,
                y,
                length: self.config.pitch_length,
                width: self.config.pitch_width,
            })
        }
    }

    fn third_unchecked(&self, x: f64) -> Third {
        if x < self.config.defensive_x_max {
            Third::Defensive
        } else if x <= self.config.final_x_min {
            Third::Midfield
        } else {
            Third::Final
        }
    }

    fn lane_unchecked(&self, y: f64) -> Lane {
        if (self.config.central_y_min..=self.config.central_y_max).contains(&y) {
            Lane::Central
        } else if y < self.config.lateral_split_y {
            Lane::Left
        } else {
            Lane::Right
        }
    }

    pub fn classify(&self, x: f64, y: f64) -> Result<ZoneLabel> {
        self.check(x, y)?;
        Ok(ZoneLabel {
            third: self.third_unchecked(x),
            lane: self.lane_unchecked(y),
        })
    }

    pub fn classify_location(&self, location: &Location) -> Result<ZoneLabel> {
        self.classify(location.x, location.y)
    }

    /// x-only classification; y must still lie on the pitch.
    pub fn classify_third(&self, location: &Location) -> Result<Third> {
        self.classify_location(location).map(|z| z.third)
    }

    pub fn classify_lane(&self, location: &Location) -> Result<Lane> {
        self.classify_location(location).map(|z| z.lane)
    }

    /// Whether `x` lies within the entry band around `cut`.
    pub fn near_cut(&self, x: f64, cut: f64) -> bool {
        (x - cut).abs() <= self.config.entry_band_half_width
    }

    /// Inclusive x range of the designated target band.
    pub fn target_range(&self) -> (f64, f64) {
        self.config.band_range(self.config.target_band)
    }

    pub fn in_target_band(&self, location: &Location) -> Result<bool> {
        Ok(self.classify_third(location)? == self.config.target_band)
    }

    /// Coverage grid cell of a location inside the target band.
    pub fn coverage_cell(&self, location: &Location) -> Result<Option<(usize, usize)>> {
        if !self.in_target_band(location)? {
            return Ok(None);
        }
        let (lo, hi) = self.target_range();
        let n = self.config.coverage_grid_cells;
        let col = bucket(location.x - lo, hi - lo, n);
        let row = bucket(location.y, self.config.pitch_width, n);
        Ok(Some((col, row)))
    }
}

fn bucket(offset: f64, extent: f64, n: usize) -> usize {
    if extent <= 0.0 {
        return 0;
    }
    let idx = (offset / extent * n as f64).floor() as usize;
    idx.min(n.saturating_sub(1))
}
