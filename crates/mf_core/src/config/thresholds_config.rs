//! Numeric thresholds shared across feature categories
//!
//! | Category | Description |
//! |----------|-------------|
//! | Progressive | Pass/carry length and forward-gain cuts |
//! | Windows | Pressure, reaction and transition windows |
//! | Clock | Period offsets and half-time continuation |
//! | Bypass | Fast-bypass labelling window |
//! | Risk | Match-level risk factor flags |

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// Progressive pass/carry classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressiveConfig {
    /// Length must exceed this
    pub min_length: f64,
    /// end_x - start_x must exceed this
    pub min_forward_gain: f64,
    /// Passes longer than this count as long passes
    pub long_pass_length: f64,
}

impl Default for ProgressiveConfig {
    fn default() -> Self {
        Self {
            min_length: 10.0,
            min_forward_gain: 5.0,
            long_pass_length: 20.0,
        }
    }
}

/// Time windows in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// One `pressure_within_{N}s` feature per entry
    pub pressure_windows_s: Vec<f64>,
    pub immediate_pressure_s: f64,
    /// Gap after a carry in which a defensive action interrupts it
    pub carry_interruption_s: f64,
    /// Recovery this soon after possession start counts as a transition recovery
    pub transition_recovery_s: f64,
    /// Pressure this soon after losing the ball counts as counter-press
    pub counter_press_s: f64,
    /// Trailing window for pressing intensity
    pub pressing_intensity_s: f64,
    /// Width of time-window aggregation buckets
    pub time_window_minutes: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            pressure_windows_s: vec![5.0, 10.0],
            immediate_pressure_s: 2.0,
            carry_interruption_s: 2.0,
            transition_recovery_s: 3.0,
            counter_press_s: 5.0,
            pressing_intensity_s: 10.0,
            time_window_minutes: 15.0,
        }
    }
}

/// Match clock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Carry elapsed time across period boundaries using `period_offsets_s`
    pub half_time_continuation: bool,
    /// Offset of period `n` at index `n - 1`
    pub period_offsets_s: Vec<f64>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            half_time_continuation: false,
            period_offsets_s: vec![0.0, 2700.0, 5400.0, 6300.0],
        }
    }
}

impl ClockConfig {
    pub fn continuous() -> Self {
        Self {
            half_time_continuation: true,
            ..Self::default()
        }
    }

    /// Offset of a period; periods past the table continue 15 minutes apart.
    pub fn offset_for(&self, period: u8) -> f64 {
        let idx = period.saturating_sub(1) as usize;
        match self.period_offsets_s.get(idx) {
            Some(offset) => *offset,
            None => {
                let last = self.period_offsets_s.last().copied().unwrap_or(0.0);
                let extra = idx + 1 - self.period_offsets_s.len().max(1);
                last + 900.0 * extra as f64
            }
        }
    }
}

/// Fast-bypass labelling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BypassWindowConfig {
    pub window_s: f64,
    pub max_passes: u32,
}

impl Default for BypassWindowConfig {
    fn default() -> Self {
        Self {
            window_s: 15.0,
            max_passes: 5,
        }
    }
}

/// Match-level risk factor cut-offs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// progressive_passes_allowed above this
    pub progressive_passes: f64,
    /// through_balls_allowed above this
    pub through_balls: f64,
    /// carries_through_region above this
    pub carries_through_region: f64,
    /// bypass_prevention_rate below this
    pub min_bypass_prevention: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            progressive_passes: 50.0,
            through_balls: 10.0,
            carries_through_region: 20.0,
            min_bypass_prevention: 0.5,
        }
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ExtractError::InvalidConfig(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ExtractError::InvalidConfig(format!(
            "{} must be non-negative, got {}",
            name, value
        )))
    }
}

impl ProgressiveConfig {
    pub fn validate(&self) -> Result<()> {
        require_non_negative("progressive.min_length", self.min_length)?;
        require_non_negative("progressive.min_forward_gain", self.min_forward_gain)?;
        require_positive("progressive.long_pass_length", self.long_pass_length)
    }
}

impl WindowConfig {
    pub fn validate(&self) -> Result<()> {
        for w in &self.pressure_windows_s {
            require_positive("windows.pressure_windows_s", *w)?;
        }
        require_positive("windows.immediate_pressure_s", self.immediate_pressure_s)?;
        require_positive("windows.carry_interruption_s", self.carry_interruption_s)?;
        require_positive("windows.transition_recovery_s", self.transition_recovery_s)?;
        require_positive("windows.counter_press_s", self.counter_press_s)?;
        require_positive("windows.pressing_intensity_s", self.pressing_intensity_s)?;
        require_positive("windows.time_window_minutes", self.time_window_minutes)
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<()> {
        if self
            .period_offsets_s
            .windows(2)
            .any(|pair| pair[1] < pair[0])
        {
            return Err(ExtractError::InvalidConfig(
                "clock.period_offsets_s must be non-decreasing".to_string(),
            ));
        }
        Ok(())
    }
}

impl BypassWindowConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("bypass.window_s", self.window_s)
    }
}
