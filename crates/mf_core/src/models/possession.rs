//! Possession units
//!
//! A possession is a maximal contiguous run of events sharing one possession
//! id. Ids may repeat after a gap, so units are keyed by (id, first index).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::event::{Event, Location, PossessionId, TeamId};

/// Unique key of a possession unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PossessionKey {
    pub id: PossessionId,
    pub first_index: u64,
}

impl fmt::Display for PossessionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.first_index)
    }
}

/// Row of an optional companion possession table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossessionRow {
    pub id: PossessionId,
    pub team_id: TeamId,
}

/// Contiguous run of events under one team's control.
#[derive(Debug, Clone, PartialEq)]
pub struct Possession {
    pub key: PossessionKey,
    pub team_id: TeamId,
    /// Ordered, never empty.
    pub events: Vec<Event>,
}

impl Possession {
    pub fn id(&self) -> PossessionId {
        self.key.id
    }

    pub fn period(&self) -> u8 {
        self.events.first().map(|e| e.period).unwrap_or(0)
    }

    pub fn start_time_s(&self) -> f64 {
        self.events.first().map(|e| e.timestamp_s).unwrap_or(0.0)
    }

    pub fn end_time_s(&self) -> f64 {
        self.events.last().map(|e| e.timestamp_s).unwrap_or(0.0)
    }

    /// In-period duration; both ends share one period.
    pub fn duration_s(&self) -> f64 {
        (self.end_time_s() - self.start_time_s()).max(0.0)
    }

    /// First recorded location in the possession.
    pub fn start_location(&self) -> Option<Location> {
        self.events.iter().find_map(|e| e.location)
    }

    pub fn max_x(&self) -> Option<f64> {
        self.events
            .iter()
            .filter_map(|e| e.location.map(|l| l.x))
            .fold(None, |acc, x| Some(acc.map_or(x, |m: f64| m.max(x))))
    }

    pub fn min_x(&self) -> Option<f64> {
        self.events
            .iter()
            .filter_map(|e| e.location.map(|l| l.x))
            .fold(None, |acc, x| Some(acc.map_or(x, |m: f64| m.min(x))))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
