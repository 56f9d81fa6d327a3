//! Seeded synthetic match streams shared by the integration tests and the bench.

#![allow(dead_code)]

use mf_core::models::{
    CarryDetails, DuelDetails, DuelOutcome, DuelType, Event, EventDetails, EventKind, Location,
    PassDetails, PassOutcome, TeamId,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const US: TeamId = 217;
pub const THEM: TeamId = 206;

const HALF_S: f64 = 2700.0;

fn location(rng: &mut ChaCha8Rng) -> Option<Location> {
    if rng.gen_bool(0.03) {
        None
    } else {
        Some(Location::new(rng.gen_range(0.0..=120.0), rng.gen_range(0.0..=80.0)))
    }
}

fn on_ball(rng: &mut ChaCha8Rng, start: Option<Location>) -> (EventKind, Option<EventDetails>) {
    let end = start.map(|s| {
        Location::new(
            (s.x + rng.gen_range(-10.0..30.0)).clamp(0.0, 120.0),
            (s.y + rng.gen_range(-20.0..20.0)).clamp(0.0, 80.0),
        )
    });
    if rng.gen_bool(0.7) {
        let outcome = if rng.gen_bool(0.8) {
            None
        } else {
            Some(PassOutcome::Incomplete)
        };
        let details = PassDetails {
            end_location: end,
            length: start.zip(end).map(|(a, b)| a.distance_to(&b)),
            outcome,
            through_ball: rng.gen_bool(0.03).then_some(true),
            switch: rng.gen_bool(0.03).then_some(true),
            ..Default::default()
        };
        (EventKind::Pass, Some(EventDetails::Pass(details)))
    } else {
        (
            EventKind::Carry,
            Some(EventDetails::Carry(CarryDetails { end_location: end })),
        )
    }
}

fn defending(rng: &mut ChaCha8Rng) -> (EventKind, Option<EventDetails>) {
    match rng.gen_range(0..4) {
        0 => (EventKind::Pressure, None),
        1 => {
            let outcome = if rng.gen_bool(0.5) {
                DuelOutcome::Won
            } else {
                DuelOutcome::Lost
            };
            let details = DuelDetails {
                duel_type: Some(DuelType::Tackle),
                outcome: Some(outcome),
            };
            (EventKind::Duel, Some(EventDetails::Duel(details)))
        }
        2 => (EventKind::Interception, None),
        _ => (EventKind::BallRecovery, None),
    }
}

/// Two halves of alternating possessions; a few events lack a location.
pub fn synthetic_match(seed: u64, possessions: u32) -> Vec<Event> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut events = Vec::new();
    let mut index = 0u64;
    let mut period = 1u8;
    let mut t: f64 = 0.0;

    for possession in 1..=possessions {
        if period == 1 && possession > possessions / 2 {
            period = 2;
            t = 0.0;
        }
        let owner = if possession % 2 == 0 { US } else { THEM };
        let other = if owner == US { THEM } else { US };
        let length = rng.gen_range(1..=8);
        for _ in 0..length {
            index += 1;
            t = (t + rng.gen_range(0.5..6.0)).min(HALF_S + 300.0);
            let loc = location(&mut rng);
            let (actor, (kind, details)) = if rng.gen_bool(0.25) {
                (other, defending(&mut rng))
            } else {
                (owner, on_ball(&mut rng, loc))
            };
            let player_base = if actor == US { 100 } else { 200 };
            let mut event = Event::new(index, period, t, kind, actor, owner, possession)
                .with_player(player_base + rng.gen_range(1..=11))
                .with_pressure(rng.gen_bool(0.2));
            event.location = loc;
            event.details = details;
            events.push(event);
        }
    }
    events
}
