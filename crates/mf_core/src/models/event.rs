//! Event model
//!
//! One record per on-pitch action, already parsed by an adapter. Coordinates
//! use the 120 x 80 event-data pitch with the acting team attacking towards
//! higher x.

use serde::{Deserialize, Serialize};

pub type TeamId = u32;
pub type PlayerId = u32;
pub type PossessionId = u32;

/// Pitch location in event-data units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another location.
    pub fn distance_to(&self, other: &Location) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Pass,
    Carry,
    Duel,
    Interception,
    BallRecovery,
    Pressure,
    Shot,
    Block,
    Clearance,
    Dribble,
    BallReceipt,
    Dispossessed,
    Miscontrol,
    Error,
    FoulCommitted,
    StartingXi,
    Other,
}

impl EventKind {
    /// Actions that win, contest or deny the ball.
    pub fn is_defensive_action(self) -> bool {
        matches!(
            self,
            EventKind::Interception
                | EventKind::BallRecovery
                | EventKind::Duel
                | EventKind::Block
                | EventKind::Clearance
        )
    }

    /// Actions that end a possession by the actor's own fault.
    pub fn is_ball_loss(self) -> bool {
        matches!(
            self,
            EventKind::Dispossessed | EventKind::Miscontrol | EventKind::Error
        )
    }

    /// On-ball actions that move the team forward after a regain.
    pub fn is_attacking_action(self) -> bool {
        matches!(
            self,
            EventKind::Pass | EventKind::Shot | EventKind::Carry | EventKind::Dribble
        )
    }
}

/// Pass outcome. An absent outcome means the pass was completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    Complete,
    Incomplete,
    Out,
    Blocked,
    Offside,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelType {
    Aerial,
    Tackle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelOutcome {
    Won,
    SuccessInPlay,
    SuccessOut,
    Lost,
    LostInPlay,
    LostOut,
}

impl DuelOutcome {
    pub fn is_won(self) -> bool {
        matches!(
            self,
            DuelOutcome::Won | DuelOutcome::SuccessInPlay | DuelOutcome::SuccessOut
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptionOutcome {
    Won,
    Success,
    SuccessInPlay,
    SuccessOut,
    Lost,
    LostInPlay,
    LostOut,
}

impl InterceptionOutcome {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            InterceptionOutcome::Won
                | InterceptionOutcome::Success
                | InterceptionOutcome::SuccessInPlay
                | InterceptionOutcome::SuccessOut
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotOutcome {
    Goal,
    Saved,
    Blocked,
    OffTarget,
    Post,
    Wayward,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayPattern {
    RegularPlay,
    FromCorner,
    FromFreeKick,
    FromThrowIn,
    FromKickOff,
    FromGoalKick,
    FromKeeper,
    FromCounter,
    Other,
}

impl PlayPattern {
    pub fn is_set_piece(self) -> bool {
        matches!(
            self,
            PlayPattern::FromCorner
                | PlayPattern::FromFreeKick
                | PlayPattern::FromThrowIn
                | PlayPattern::FromKickOff
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    /// Radians, 0 = straight towards the opponent goal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PassOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub through_ball: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch: Option<bool>,
}

impl PassDetails {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, None | Some(PassOutcome::Complete))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarryDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuelDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duel_type: Option<DuelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DuelOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterceptionDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<InterceptionOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_failure: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ShotOutcome>,
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "payload", rename_all = "snake_case")]
pub enum EventDetails {
    Pass(PassDetails),
    Carry(CarryDetails),
    Duel(DuelDetails),
    Interception(InterceptionDetails),
    BallRecovery(RecoveryDetails),
    Shot(ShotDetails),
}

/// Atomic action record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Monotonic position in the match timeline.
    pub index: u64,
    pub period: u8,
    /// Seconds elapsed since the start of `period`.
    pub timestamp_s: f64,
    pub kind: EventKind,
    pub team_id: TeamId,
    pub possession_team_id: TeamId,
    pub possession: PossessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub under_pressure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterpress: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_pattern: Option<PlayPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EventDetails>,
}

impl Event {
    /// Minimal event; optional attributes start absent.
    pub fn new(
        index: u64,
        period: u8,
        timestamp_s: f64,
        kind: EventKind,
        team_id: TeamId,
        possession_team_id: TeamId,
        possession: PossessionId,
    ) -> Self {
        Self {
            id: format!("ev-{}", index),
            index,
            period,
            timestamp_s,
            kind,
            team_id,
            possession_team_id,
            possession,
            player_id: None,
            location: None,
            under_pressure: None,
            counterpress: None,
            play_pattern: None,
            details: None,
        }
    }

    pub fn with_location(mut self, x: f64, y: f64) -> Self {
        self.location = Some(Location::new(x, y));
        self
    }

    pub fn with_player(mut self, player_id: PlayerId) -> Self {
        self.player_id = Some(player_id);
        self
    }

    pub fn with_pressure(mut self, under_pressure: bool) -> Self {
        self.under_pressure = Some(under_pressure);
        self
    }

    pub fn with_play_pattern(mut self, pattern: PlayPattern) -> Self {
        self.play_pattern = Some(pattern);
        self
    }

    pub fn with_details(mut self, details: EventDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Pass payload, only when this event is a pass.
    pub fn pass(&self) -> Option<&PassDetails> {
        match (&self.kind, &self.details) {
            (EventKind::Pass, Some(EventDetails::Pass(p))) => Some(p),
            _ => None,
        }
    }

    pub fn carry(&self) -> Option<&CarryDetails> {
        match (&self.kind, &self.details) {
            (EventKind::Carry, Some(EventDetails::Carry(c))) => Some(c),
            _ => None,
        }
    }

    pub fn duel(&self) -> Option<&DuelDetails> {
        match (&self.kind, &self.details) {
            (EventKind::Duel, Some(EventDetails::Duel(d))) => Some(d),
            _ => None,
        }
    }

    pub fn interception(&self) -> Option<&InterceptionDetails> {
        match (&self.kind, &self.details) {
            (EventKind::Interception, Some(EventDetails::Interception(i))) => Some(i),
            _ => None,
        }
    }

    pub fn recovery(&self) -> Option<&RecoveryDetails> {
        match (&self.kind, &self.details) {
            (EventKind::BallRecovery, Some(EventDetails::BallRecovery(r))) => Some(r),
            _ => None,
        }
    }

    pub fn shot(&self) -> Option<&ShotDetails> {
        match (&self.kind, &self.details) {
            (EventKind::Shot, Some(EventDetails::Shot(s))) => Some(s),
            _ => None,
        }
    }

    /// End location of a pass or carry.
    pub fn end_location(&self) -> Option<Location> {
        self.pass()
            .and_then(|p| p.end_location)
            .or_else(|| self.carry().and_then(|c| c.end_location))
    }

    pub fn is_goal(&self) -> bool {
        self.shot().and_then(|s| s.outcome) == Some(ShotOutcome::Goal)
    }
}
