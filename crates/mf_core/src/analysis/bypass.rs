//! # Bypass Detector
//!
//! Possession-level classification of attempts to skip the middle of the
//! pitch.
//!
//! ## Labels
//! - **Attempt**: the possession starts in the defensive third
//!   (`start x < defensive cut`) and its furthest location passes the final
//!   cut (`max x > final cut`). The path in between does not matter.
//! - **NotAttempt**: anything else with a usable start location.
//! - **Undetermined**: no on-pitch location to start from.
//!
//! The windowed variant labels a fast bypass: the final third is reached
//! within `window_s` of possession start with at most `max_passes` passes
//! played so far.
//!
//! ```text
//! prevention rate = 1 − attempts / opponent possessions   (undefined if none)
//! ```

use serde::{Deserialize, Serialize};

use crate::analysis::windows::{MatchClock, Timeline};
use crate::analysis::zones::{Third, ZoneClassifier};
use crate::config::BypassWindowConfig;
use crate::models::{EventKind, FeatureValue, Location, Possession, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassLabel {
    Attempt,
    NotAttempt,
    Undetermined,
}

impl BypassLabel {
    pub fn is_attempt(self) -> bool {
        self == BypassLabel::Attempt
    }

    /// 1 for an attempt, 0 otherwise, undefined when undetermined.
    pub fn as_feature(self) -> FeatureValue {
        match self {
            BypassLabel::Attempt => FeatureValue::Value(1.0),
            BypassLabel::NotAttempt => FeatureValue::Value(0.0),
            BypassLabel::Undetermined => FeatureValue::Undefined,
        }
    }
}

/// Locations of the possession that lie on the pitch, in order.
fn on_pitch<'a>(
    possession: &'a Possession,
    classifier: &'a ZoneClassifier,
) -> impl Iterator<Item = Location> + 'a {
    possession
        .events
        .iter()
        .filter_map(|e| e.location)
        .filter(|loc| classifier.classify_location(loc).is_ok())
}

pub fn detect(possession: &Possession, classifier: &ZoneClassifier) -> BypassLabel {
    let mut points = on_pitch(possession, classifier);
    let Some(start) = points.next() else {
        return BypassLabel::Undetermined;
    };
    let max_x = points.fold(start.x, |m, p| m.max(p.x));
    let zones = classifier.config();
    if start.x < zones.defensive_x_max && max_x > zones.final_x_min {
        BypassLabel::Attempt
    } else {
        BypassLabel::NotAttempt
    }
}

/// Fast-bypass label bounded by time and passes since possession start.
pub fn detect_within_window(
    possession: &Possession,
    classifier: &ZoneClassifier,
    clock: &MatchClock,
    window: &BypassWindowConfig,
) -> BypassLabel {
    if on_pitch(possession, classifier).next().is_none() {
        return BypassLabel::Undetermined;
    }
    let timeline = Timeline::new(&possession.events, clock);
    let mut passes = 0u32;
    for (pos, event) in possession.events.iter().enumerate() {
        match timeline.elapsed_since_start(pos) {
            Some(dt) if dt <= window.window_s => {}
            _ => break,
        }
        if event.kind == EventKind::Pass {
            passes += 1;
        }
        let in_final = event
            .location
            .and_then(|loc| classifier.classify_third(&loc).ok())
            == Some(Third::Final);
        if in_final && passes <= window.max_passes {
            return BypassLabel::Attempt;
        }
    }
    BypassLabel::NotAttempt
}

/// Attempts among the opponent possessions of a set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BypassSummary {
    pub attempts: usize,
    pub opponent_possessions: usize,
}

impl BypassSummary {
    pub fn collect<'a>(
        possessions: impl IntoIterator<Item = &'a Possession>,
        classifier: &ZoneClassifier,
        target_team: TeamId,
    ) -> Self {
        let mut summary = Self::default();
        for p in possessions.into_iter().filter(|p| p.team_id != target_team) {
            summary.opponent_possessions += 1;
            if detect(p, classifier).is_attempt() {
                summary.attempts += 1;
            }
        }
        summary
    }

    pub fn prevention_rate(&self) -> FeatureValue {
        if self.opponent_possessions == 0 {
            return FeatureValue::Undefined;
        }
        FeatureValue::from_f64(1.0 - self.attempts as f64 / self.opponent_possessions as f64)
    }
}

pub fn bypass_prevention_rate<'a>(
    possessions: impl IntoIterator<Item = &'a Possession>,
    classifier: &ZoneClassifier,
    target_team: TeamId,
) -> FeatureValue {
    BypassSummary::collect(possessions, classifier, target_team).prevention_rate()
}
