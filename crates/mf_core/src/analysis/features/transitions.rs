//! # Recovery and transition features
//!
//! What happens around a change of possession in the target band.
//!
//! ## Anchors
//! - transition recovery: our band recovery with opponent possession in the
//!   `transition_recovery_s` seconds before it
//! - counter-press: from the first ball loss of one of our possessions (or
//!   its last event when the opponent takes over next), our pressing actions
//!   within `counter_press_s`
//! - recovery to attack: band recovery to our next attacking action

use super::{mean, Category, FeatureContext, FeatureDef, Measured, Scope, TEAM_LEVELS};
use crate::analysis::predicates::{is_won_duel, EventFilter, Side};
use crate::config::ExtractionConfig;
use crate::models::{Event, EventKind, Exclusions, Possession};

const CAT: Category = Category::Transitions;

/// Our actions that count as pressing to win the ball straight back.
const COUNTER_PRESS_ACTIONS: &[EventKind] = &[
    EventKind::Interception,
    EventKind::Duel,
    EventKind::BallRecovery,
    EventKind::Pressure,
    EventKind::Block,
];

/// Final actions of ours that end an opponent possession as a forced turnover.
const TURNOVER_ACTIONS: &[EventKind] = &[
    EventKind::Interception,
    EventKind::BallRecovery,
    EventKind::Duel,
];

const BALL_LOSSES: &[EventKind] = &[
    EventKind::Dispossessed,
    EventKind::Miscontrol,
    EventKind::Error,
];

pub(super) fn register(defs: &mut Vec<FeatureDef>, _config: &ExtractionConfig) {
    defs.extend([
        FeatureDef::simple("transition_recoveries", CAT, TEAM_LEVELS, transition_recoveries),
        FeatureDef::simple("counter_press_actions", CAT, TEAM_LEVELS, counter_press_actions),
        FeatureDef::simple("recovery_to_attack_mean", CAT, TEAM_LEVELS, recovery_to_attack_mean),
        FeatureDef::simple(
            "possessions_won_in_region",
            CAT,
            TEAM_LEVELS,
            possessions_won_in_region,
        ),
        FeatureDef::simple(
            "possessions_lost_in_region",
            CAT,
            TEAM_LEVELS,
            possessions_lost_in_region,
        ),
        FeatureDef::simple("region_duel_share", CAT, TEAM_LEVELS, region_duel_share),
        FeatureDef::simple("turnover_rate", CAT, TEAM_LEVELS, turnover_rate),
    ]);
}

fn transition_recoveries<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let window = fcx.config().windows.transition_recovery_s;
    let us = fcx.ctx.target_team();
    let timeline = fcx.stream_timeline();
    let s = fcx.ours_in_band(scope, &[EventKind::BallRecovery]);
    let n = s.count_where(|recovery| {
        timeline.position_of(recovery.index).is_some_and(|pos| {
            timeline.occurred_before_within(pos, window, |e| e.possession_team_id != us)
        })
    });
    Measured::count(n, s.excluded)
}

/// Where one of our possessions was lost, if it was.
fn loss_anchor<'a>(possession: &'a Possession, fcx: &FeatureContext<'a>) -> Option<&'a Event> {
    let us = fcx.ctx.target_team();
    if let Some(loss) = possession
        .events
        .iter()
        .find(|e| e.team_id == us && e.kind.is_ball_loss())
    {
        return Some(loss);
    }
    let after = fcx
        .possessions
        .partition_point(|p| p.key.first_index <= possession.key.first_index);
    let next = fcx.possessions.get(after)?;
    if next.team_id != us {
        possession.events.last()
    } else {
        None
    }
}

fn counter_press_actions<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let window = fcx.config().windows.counter_press_s;
    let us = fcx.ctx.target_team();
    let timeline = fcx.stream_timeline();
    let n: usize = scope
        .our_possessions(fcx.ctx)
        .into_iter()
        .filter_map(|p| loss_anchor(p, fcx))
        .filter_map(|anchor| timeline.position_of(anchor.index))
        .map(|pos| {
            timeline.count_within(pos, window, |e| {
                e.team_id == us && COUNTER_PRESS_ACTIONS.contains(&e.kind)
            })
        })
        .sum();
    Measured::count(n, Exclusions::default())
}

fn recovery_to_attack_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let us = fcx.ctx.target_team();
    let timeline = fcx.stream_timeline();
    let s = fcx.ours_in_band(scope, &[EventKind::BallRecovery]);
    let times: Vec<f64> = s
        .events
        .iter()
        .filter_map(|recovery| {
            let pos = timeline.position_of(recovery.index)?;
            timeline.reaction_time(pos, |e| e.team_id == us && e.kind.is_attacking_action())
        })
        .collect();
    Measured::option(mean(&times), s.excluded)
}

fn possessions_won_in_region<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let mut excluded = Exclusions::default();
    let mut n = 0;
    for p in scope.our_possessions(fcx.ctx) {
        match p.start_location() {
            Some(loc) => match fcx.ctx.classifier.in_target_band(&loc) {
                Ok(true) => n += 1,
                Ok(false) => {}
                Err(_) => excluded.out_of_range += 1,
            },
            None => excluded.missing_location += 1,
        }
    }
    Measured::count(n, excluded)
}

fn possessions_lost_in_region<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = EventFilter::new()
        .actor(Side::Us)
        .possession(Side::Us)
        .kinds(BALL_LOSSES)
        .in_target_band(fcx.ctx)
        .apply(fcx.ctx, scope.events.iter().copied());
    Measured::of_subset(&s)
}

/// Our won duels over all duels in the band.
fn region_duel_share<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let us = fcx.ctx.target_team();
    let s = EventFilter::new()
        .kind(EventKind::Duel)
        .in_target_band(fcx.ctx)
        .apply(fcx.ctx, scope.events.iter().copied());
    let won = s.count_where(|e| e.team_id == us && is_won_duel(e));
    Measured::ratio(won as f64, s.len() as f64, s.excluded)
}

fn turnover_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let us = fcx.ctx.target_team();
    let possessions = scope.opponent_possessions(fcx.ctx);
    let forced = possessions
        .iter()
        .filter(|p| {
            p.events
                .last()
                .is_some_and(|e| e.team_id == us && TURNOVER_ACTIONS.contains(&e.kind))
        })
        .count();
    Measured::ratio(
        forced as f64,
        possessions.len() as f64,
        Exclusions::default(),
    )
}

#[cfg(test)]
mod tests {
    use crate::analysis::features::fixtures::*;
    use crate::models::{DuelOutcome, DuelType, Event, EventKind, FeatureValue};

    fn stream() -> Vec<Event> {
        vec![
            // Opponent possession ends with our band recovery
            ev(1, 0.0, EventKind::Pass, THEM, THEM, 1).with_location(50.0, 40.0),
            ev(2, 2.0, EventKind::BallRecovery, US, THEM, 1).with_location(55.0, 40.0),
            // Our possession starting in the band, lost by a miscontrol
            ev(3, 4.0, EventKind::Pass, US, US, 2).with_location(55.0, 40.0),
            ev(4, 6.0, EventKind::Miscontrol, US, US, 2).with_location(60.0, 40.0),
            // Opponent possession; we press twice within 5 s and win a duel
            ev(5, 7.0, EventKind::Pass, THEM, THEM, 3).with_location(60.0, 40.0),
            ev(6, 8.0, EventKind::Pressure, US, THEM, 3).with_location(62.0, 40.0),
            ev(7, 10.0, EventKind::Duel, US, THEM, 3)
                .with_location(62.0, 40.0)
                .with_details(duel_details(DuelType::Tackle, DuelOutcome::Won)),
            // Our possession from a deep start, ends by possession change
            ev(8, 12.0, EventKind::Carry, US, US, 4).with_location(20.0, 40.0),
            ev(9, 20.0, EventKind::Pass, US, US, 4).with_location(30.0, 40.0),
            // Opponent possession; duel lost by us in the band
            ev(10, 21.0, EventKind::Pass, THEM, THEM, 5).with_location(70.0, 40.0),
            ev(11, 22.0, EventKind::Duel, US, THEM, 5)
                .with_location(70.0, 40.0)
                .with_details(duel_details(DuelType::Aerial, DuelOutcome::Lost)),
            ev(12, 23.0, EventKind::Pass, THEM, THEM, 5).with_location(72.0, 40.0),
        ]
    }

    #[test]
    fn test_recoveries_and_attack_time() {
        let fx = Fixture::new(stream());
        assert_value(fx.value("transition_recoveries"), 1.0);
        // Recovery at 2 s, our first pass at 4 s
        assert_value(fx.value("recovery_to_attack_mean"), 2.0);
    }

    #[test]
    fn test_counter_press_after_loss() {
        let fx = Fixture::new(stream());
        // After the miscontrol at 6 s: pressure at 8, duel at 10.
        // After our last pass at 20 s: nothing of ours but the duel at 22.
        assert_value(fx.value("counter_press_actions"), 3.0);
    }

    #[test]
    fn test_possession_won_and_lost() {
        let fx = Fixture::new(stream());
        assert_value(fx.value("possessions_won_in_region"), 1.0);
        assert_value(fx.value("possessions_lost_in_region"), 1.0);
    }

    #[test]
    fn test_duel_share_and_turnovers() {
        let fx = Fixture::new(stream());
        assert_value(fx.value("region_duel_share"), 0.5);
        // Possessions 1 and 3 end on our recovery / duel, 5 does not
        assert_value(fx.value("turnover_rate"), 2.0 / 3.0);
    }

    #[test]
    fn test_no_recovery_is_undefined() {
        let fx = Fixture::new(vec![
            ev(1, 0.0, EventKind::Pass, THEM, THEM, 1).with_location(50.0, 40.0),
        ]);
        assert_eq!(fx.value("recovery_to_attack_mean"), FeatureValue::Undefined);
        assert_eq!(fx.value("region_duel_share"), FeatureValue::Undefined);
        assert_value(fx.value("turnover_rate"), 0.0);
    }
}
