//! mapper.rs
//! StatsBomb-style names and shapes -> mf_core event types.

use tracing::{debug, warn};

use mf_core::models::{
    CarryDetails, DuelDetails, DuelOutcome, DuelType, Event, EventDetails, EventKind,
    InterceptionDetails, InterceptionOutcome, Location, PassDetails, PassOutcome, PlayPattern,
    RecoveryDetails, ShotDetails, ShotOutcome,
};

use crate::statsbomb::{Named, RawDuel, RawEvent, RawPass};
use crate::AdapterError;

pub fn event_kind(name: &str) -> EventKind {
    match name {
        "Pass" => EventKind::Pass,
        "Carry" => EventKind::Carry,
        "Duel" => EventKind::Duel,
        "Interception" => EventKind::Interception,
        "Ball Recovery" => EventKind::BallRecovery,
        "Pressure" => EventKind::Pressure,
        "Shot" => EventKind::Shot,
        "Block" => EventKind::Block,
        "Clearance" => EventKind::Clearance,
        "Dribble" => EventKind::Dribble,
        "Ball Receipt*" | "Ball Receipt" => EventKind::BallReceipt,
        "Dispossessed" => EventKind::Dispossessed,
        "Miscontrol" => EventKind::Miscontrol,
        "Error" => EventKind::Error,
        "Foul Committed" => EventKind::FoulCommitted,
        "Starting XI" => EventKind::StartingXi,
        other => {
            debug!(kind = other, "unmapped event type");
            EventKind::Other
        }
    }
}

pub fn play_pattern(name: &str) -> PlayPattern {
    match name {
        "Regular Play" => PlayPattern::RegularPlay,
        "From Corner" => PlayPattern::FromCorner,
        "From Free Kick" => PlayPattern::FromFreeKick,
        "From Throw In" => PlayPattern::FromThrowIn,
        "From Kick Off" => PlayPattern::FromKickOff,
        "From Goal Kick" => PlayPattern::FromGoalKick,
        "From Keeper" => PlayPattern::FromKeeper,
        "From Counter" => PlayPattern::FromCounter,
        _ => PlayPattern::Other,
    }
}

fn pass_outcome(name: &str) -> PassOutcome {
    match name {
        "Complete" => PassOutcome::Complete,
        "Incomplete" => PassOutcome::Incomplete,
        "Out" => PassOutcome::Out,
        "Blocked" => PassOutcome::Blocked,
        "Pass Offside" | "Offside" => PassOutcome::Offside,
        _ => PassOutcome::Unknown,
    }
}

fn duel_outcome(name: &str) -> Option<DuelOutcome> {
    Some(match name {
        "Won" => DuelOutcome::Won,
        "Success In Play" => DuelOutcome::SuccessInPlay,
        "Success Out" => DuelOutcome::SuccessOut,
        "Lost" => DuelOutcome::Lost,
        "Lost In Play" => DuelOutcome::LostInPlay,
        "Lost Out" => DuelOutcome::LostOut,
        _ => return None,
    })
}

fn interception_outcome(name: &str) -> Option<InterceptionOutcome> {
    Some(match name {
        "Won" => InterceptionOutcome::Won,
        "Success" => InterceptionOutcome::Success,
        "Success In Play" => InterceptionOutcome::SuccessInPlay,
        "Success Out" => InterceptionOutcome::SuccessOut,
        "Lost" => InterceptionOutcome::Lost,
        "Lost In Play" => InterceptionOutcome::LostInPlay,
        "Lost Out" => InterceptionOutcome::LostOut,
        _ => return None,
    })
}

fn shot_outcome(name: &str) -> ShotOutcome {
    match name {
        "Goal" => ShotOutcome::Goal,
        "Saved" | "Saved Off Target" | "Saved to Post" => ShotOutcome::Saved,
        "Blocked" => ShotOutcome::Blocked,
        "Off T" | "Off Target" => ShotOutcome::OffTarget,
        "Post" => ShotOutcome::Post,
        "Wayward" => ShotOutcome::Wayward,
        _ => ShotOutcome::Other,
    }
}

/// `HH:MM:SS.mmm` (or `MM:SS.mmm`) to seconds.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let mut seconds = 0.0;
    let mut parts = 0;
    for part in value.split(':') {
        let n: f64 = part.trim().parse().ok()?;
        if !n.is_finite() || n < 0.0 {
            return None;
        }
        seconds = seconds * 60.0 + n;
        parts += 1;
    }
    (1..=3).contains(&parts).then_some(seconds)
}

/// `[x, y]` pair; anything shorter is treated as absent.
fn location(index: u64, raw: Option<&[f64]>) -> Option<Location> {
    match raw? {
        [x, y, ..] => Some(Location::new(*x, *y)),
        other => {
            warn!(index, len = other.len(), "location with fewer than two coordinates dropped");
            None
        }
    }
}

fn name_of(named: Option<&Named>) -> Option<&str> {
    named.and_then(Named::name)
}

fn pass_details(index: u64, raw: &RawPass) -> PassDetails {
    let through_ball = raw
        .through_ball
        .or_else(|| (name_of(raw.technique.as_ref()) == Some("Through Ball")).then_some(true));
    PassDetails {
        end_location: location(index, raw.end_location.as_deref()),
        length: raw.length,
        angle: raw.angle,
        outcome: name_of(raw.outcome.as_ref()).map(pass_outcome),
        through_ball,
        switch: raw.switch,
    }
}

fn duel_details(raw: &RawDuel) -> DuelDetails {
    let type_name = name_of(raw.duel_type.as_ref());
    let duel_type = type_name.map(|name| match name {
        "Aerial Lost" | "Aerial" => DuelType::Aerial,
        "Tackle" => DuelType::Tackle,
        _ => DuelType::Other,
    });
    // An aerial lost carries no outcome object of its own
    let outcome = name_of(raw.outcome.as_ref())
        .and_then(duel_outcome)
        .or_else(|| (type_name == Some("Aerial Lost")).then_some(DuelOutcome::Lost));
    DuelDetails { duel_type, outcome }
}

fn details(index: u64, kind: EventKind, raw: &RawEvent) -> Option<EventDetails> {
    match kind {
        EventKind::Pass => raw
            .pass
            .as_ref()
            .map(|p| EventDetails::Pass(pass_details(index, p))),
        EventKind::Carry => raw.carry.as_ref().map(|c| {
            EventDetails::Carry(CarryDetails {
                end_location: location(index, c.end_location.as_deref()),
            })
        }),
        EventKind::Duel => raw.duel.as_ref().map(|d| EventDetails::Duel(duel_details(d))),
        EventKind::Interception => raw.interception.as_ref().map(|i| {
            EventDetails::Interception(InterceptionDetails {
                outcome: name_of(i.outcome.as_ref()).and_then(interception_outcome),
            })
        }),
        EventKind::BallRecovery => Some(EventDetails::BallRecovery(RecoveryDetails {
            recovery_failure: raw.ball_recovery.as_ref().and_then(|r| r.recovery_failure),
        })),
        EventKind::Shot => raw.shot.as_ref().map(|s| {
            EventDetails::Shot(ShotDetails {
                outcome: name_of(s.outcome.as_ref()).map(shot_outcome),
            })
        }),
        _ => None,
    }
}

/// Map one raw event. `fallback_index` is used when the object has no
/// `index` of its own.
pub fn to_core_event(raw: &RawEvent, fallback_index: u64) -> Result<Event, AdapterError> {
    let index = raw.index.unwrap_or(fallback_index);
    let timestamp_s =
        parse_timestamp(&raw.timestamp).ok_or_else(|| AdapterError::Timestamp {
            index,
            value: raw.timestamp.clone(),
        })?;
    let team_id = raw.team.id.ok_or(AdapterError::MissingField {
        index,
        field: "team.id",
    })?;
    let possession_team_id = raw.possession_team.id.ok_or(AdapterError::MissingField {
        index,
        field: "possession_team.id",
    })?;
    let kind = match raw.kind.name() {
        Some(name) => event_kind(name),
        None => EventKind::Other,
    };

    let mut event = Event::new(
        index,
        raw.period,
        timestamp_s,
        kind,
        team_id,
        possession_team_id,
        raw.possession,
    );
    if let Some(id) = &raw.id {
        event.id = id.clone();
    }
    event.player_id = raw.player.as_ref().and_then(|p| p.id);
    event.location = location(index, raw.location.as_deref());
    event.under_pressure = raw.under_pressure;
    event.counterpress = raw.counterpress;
    event.play_pattern = name_of(raw.play_pattern.as_ref()).map(play_pattern);
    event.details = details(index, kind, raw);
    Ok(event)
}
