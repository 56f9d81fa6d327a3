//! # Possession Segmenter
//!
//! Partitions an ordered event stream into possession units.
//!
//! ## Algorithm
//! 1. Reject the stream unless sequence indices strictly increase
//! 2. Open a unit at the first event
//! 3. Close the current unit whenever the boundary key changes
//!    (possession id, or team/period in [`SegmentationMode::ByTeamAndPeriod`])
//! 4. Key each unit by (possession id, first sequence index) so an id that
//!    reappears after a gap becomes a separate unit

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::{ExtractError, Result};
use crate::models::{Event, Possession, PossessionId, PossessionKey, PossessionRow, TeamId};

/// Where possession boundaries come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Boundary whenever the possession id changes.
    #[default]
    ByPossessionId,
    /// Boundary whenever the possessing team or the period changes.
    ByTeamAndPeriod,
}

impl SegmentationMode {
    /// Whether `next` opens a new unit after `prev`.
    pub(crate) fn boundary(self, prev: &Event, next: &Event) -> bool {
        match self {
            SegmentationMode::ByPossessionId => prev.possession != next.possession,
            SegmentationMode::ByTeamAndPeriod => {
                prev.possession_team_id != next.possession_team_id || prev.period != next.period
            }
        }
    }
}

/// Fails with `MalformedStream` unless indices strictly increase.
pub fn check_ordering(events: &[Event]) -> Result<()> {
    for pair in events.windows(2) {
        if pair[1].index <= pair[0].index {
            return Err(ExtractError::MalformedStream {
                previous: pair[0].index,
                current: pair[1].index,
            });
        }
    }
    Ok(())
}

/// Accumulates one unit while scanning.
pub(crate) struct PossessionBuilder {
    key: PossessionKey,
    team_id: TeamId,
    events: Vec<Event>,
}

impl PossessionBuilder {
    pub(crate) fn new(first: &Event) -> Self {
        Self {
            key: PossessionKey {
                id: first.possession,
                first_index: first.index,
            },
            team_id: first.possession_team_id,
            events: vec![first.clone()],
        }
    }

    pub(crate) fn add(&mut self, event: &Event) {
        self.events.push(event.clone());
    }

    pub(crate) fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn build(self) -> Possession {
        Possession {
            key: self.key,
            team_id: self.team_id,
            events: self.events,
        }
    }
}

/// Split `events` into possession units.
pub fn segment(events: &[Event], mode: SegmentationMode) -> Result<Vec<Possession>> {
    check_ordering(events)?;

    let mut possessions = Vec::new();
    let mut current: Option<PossessionBuilder> = None;

    for event in events {
        match current.as_mut() {
            Some(builder) if builder.last().is_some_and(|prev| !mode.boundary(prev, event)) => {
                builder.add(event);
            }
            _ => {
                if let Some(done) = current.take() {
                    possessions.push(done.build());
                }
                current = Some(PossessionBuilder::new(event));
            }
        }
    }
    if let Some(done) = current {
        possessions.push(done.build());
    }

    Ok(possessions)
}

/// Segment, then take each unit's team from a companion table.
///
/// Ids missing from the table, or whose table team disagrees with the
/// events, keep the event value and are logged.
pub fn segment_with_table(
    events: &[Event],
    mode: SegmentationMode,
    table: &[PossessionRow],
) -> Result<Vec<Possession>> {
    let mut possessions = segment(events, mode)?;
    let lookup: BTreeMap<PossessionId, TeamId> =
        table.iter().map(|row| (row.id, row.team_id)).collect();

    for possession in &mut possessions {
        match lookup.get(&possession.id()) {
            Some(team) if *team == possession.team_id => {}
            Some(team) => {
                warn!(
                    possession = %possession.key,
                    table_team = team,
                    event_team = possession.team_id,
                    "possession table disagrees with event stream; keeping event team"
                );
            }
            None => {
                warn!(possession = %possession.key, "possession id missing from table");
            }
        }
    }
    Ok(possessions)
}
