//! Defensive actions in the target band: interceptions, recoveries, duels.

use super::{
    mean, population_std, xs, ys, Category, FeatureContext, FeatureDef, Measured, Scope,
    DEFENSIVE_ACTIONS, TEAM_LEVELS,
};
use crate::analysis::predicates::{
    is_successful_defensive_action, is_successful_interception, is_successful_recovery,
    is_under_pressure, is_won_duel,
};
use crate::config::ExtractionConfig;
use crate::models::{DuelType, Event, EventKind, Location};

const CAT: Category = Category::Defensive;

pub(super) fn register(defs: &mut Vec<FeatureDef>, config: &ExtractionConfig) {
    defs.extend([
        FeatureDef::simple("interceptions_total", CAT, TEAM_LEVELS, interceptions_total),
        FeatureDef::simple(
            "interceptions_per_opp_possession",
            CAT,
            TEAM_LEVELS,
            interceptions_per_opp_possession,
        ),
        FeatureDef::simple(
            "interception_success_rate",
            CAT,
            TEAM_LEVELS,
            interception_success_rate,
        ),
        FeatureDef::simple("interceptions_central", CAT, TEAM_LEVELS, interceptions_central),
        FeatureDef::simple("interceptions_wide", CAT, TEAM_LEVELS, interceptions_wide),
        FeatureDef::simple("recoveries_total", CAT, TEAM_LEVELS, recoveries_total),
        FeatureDef::simple("recoveries_per_minute", CAT, TEAM_LEVELS, recoveries_per_minute),
        FeatureDef::simple("recovery_success_rate", CAT, TEAM_LEVELS, recovery_success_rate),
        FeatureDef::simple("recovery_x_mean", CAT, TEAM_LEVELS, recovery_x_mean),
        FeatureDef::simple("recovery_y_mean", CAT, TEAM_LEVELS, recovery_y_mean),
        FeatureDef::simple("duels_total", CAT, TEAM_LEVELS, duels_total),
        FeatureDef::simple("duel_win_rate", CAT, TEAM_LEVELS, duel_win_rate),
        FeatureDef::simple("aerial_duels_won", CAT, TEAM_LEVELS, aerial_duels_won),
        FeatureDef::simple("ground_duels_won", CAT, TEAM_LEVELS, ground_duels_won),
        FeatureDef::simple("duels_under_pressure", CAT, TEAM_LEVELS, duels_under_pressure),
        FeatureDef::simple("duel_x_mean", CAT, TEAM_LEVELS, duel_x_mean),
        FeatureDef::simple("duel_x_std", CAT, TEAM_LEVELS, duel_x_std),
        FeatureDef::simple("duel_y_mean", CAT, TEAM_LEVELS, duel_y_mean),
        FeatureDef::simple("duel_y_std", CAT, TEAM_LEVELS, duel_y_std),
        FeatureDef::simple(
            "defensive_action_efficiency",
            CAT,
            TEAM_LEVELS,
            defensive_action_efficiency,
        ),
        FeatureDef::simple(
            "pressure_to_interception_ratio",
            CAT,
            TEAM_LEVELS,
            pressure_to_interception_ratio,
        ),
    ]);

    if let Some(window) = config.windows.pressure_windows_s.first() {
        defs.push(FeatureDef::windowed(
            "recoveries_after_pressure".to_string(),
            CAT,
            TEAM_LEVELS,
            recoveries_after_pressure,
            *window,
        ));
    }
}

fn interceptions_total<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&fcx.ours_in_band(scope, &[EventKind::Interception]))
}

fn interceptions_per_opp_possession<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::Interception]);
    let opp = scope.opponent_possessions(fcx.ctx).len();
    Measured::ratio(s.len() as f64, opp as f64, s.excluded)
}

fn interception_success_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::Interception]);
    let ok = s.count_where(is_successful_interception);
    Measured::ratio(ok as f64, s.len() as f64, s.excluded)
}

fn interceptions_by_lane<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>, wide: bool) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::Interception]);
    let n = s
        .events
        .iter()
        .filter(|e| fcx.lane_of(e).is_some_and(|l| l.is_wide() == wide))
        .count();
    Measured::count(n, s.excluded)
}

fn interceptions_central<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    interceptions_by_lane(scope, fcx, false)
}

fn interceptions_wide<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    interceptions_by_lane(scope, fcx, true)
}

fn recoveries_total<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&fcx.ours_in_band(scope, &[EventKind::BallRecovery]))
}

fn recoveries_per_minute<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::BallRecovery]);
    Measured::ratio(
        s.len() as f64,
        scope.duration_minutes.unwrap_or(0.0),
        s.excluded,
    )
}

fn recovery_success_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::BallRecovery]);
    let ok = s.count_where(is_successful_recovery);
    Measured::ratio(ok as f64, s.len() as f64, s.excluded)
}

/// Recoveries preceded by one of our pressures within the window.
fn recoveries_after_pressure<'a>(
    scope: &Scope<'a>,
    fcx: &FeatureContext<'a>,
    window_s: f64,
) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::BallRecovery]);
    let timeline = fcx.stream_timeline();
    let us = fcx.ctx.target_team();
    let n = s
        .events
        .iter()
        .filter(|e| {
            timeline.position_of(e.index).is_some_and(|pos| {
                timeline.occurred_before_within(pos, window_s, |p| {
                    p.kind == EventKind::Pressure && p.team_id == us
                })
            })
        })
        .count();
    Measured::count(n, s.excluded)
}

fn located_mean<'a>(
    scope: &Scope<'a>,
    fcx: &FeatureContext<'a>,
    kind: EventKind,
    axis: fn(&[Location]) -> Vec<f64>,
    reduce: fn(&[f64]) -> Option<f64>,
) -> Measured {
    let s = fcx.ours_in_band(scope, &[kind]);
    let (points, _) = fcx.ctx.locations(s.events.iter().copied());
    Measured::option(reduce(&axis(&points)), s.excluded)
}

fn recovery_x_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_mean(scope, fcx, EventKind::BallRecovery, xs, mean)
}

fn recovery_y_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_mean(scope, fcx, EventKind::BallRecovery, ys, mean)
}

fn duels_total<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&fcx.ours_in_band(scope, &[EventKind::Duel]))
}

fn duel_win_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::Duel]);
    Measured::ratio(s.count_where(is_won_duel) as f64, s.len() as f64, s.excluded)
}

fn is_aerial(e: &Event) -> bool {
    e.duel().and_then(|d| d.duel_type) == Some(DuelType::Aerial)
}

fn aerial_duels_won<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::Duel]);
    Measured::count(s.count_where(|e| is_won_duel(e) && is_aerial(e)), s.excluded)
}

fn ground_duels_won<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::Duel]);
    Measured::count(s.count_where(|e| is_won_duel(e) && !is_aerial(e)), s.excluded)
}

fn duels_under_pressure<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::Duel]);
    Measured::count(s.count_where(is_under_pressure), s.excluded)
}

fn duel_x_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_mean(scope, fcx, EventKind::Duel, xs, mean)
}

fn duel_x_std<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_mean(scope, fcx, EventKind::Duel, xs, population_std)
}

fn duel_y_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_mean(scope, fcx, EventKind::Duel, ys, mean)
}

fn duel_y_std<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_mean(scope, fcx, EventKind::Duel, ys, population_std)
}

/// Successful defensive actions per opponent event in the band.
fn defensive_action_efficiency<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let ours = fcx.ours_in_band(scope, DEFENSIVE_ACTIONS);
    let theirs = fcx.opp_in_band(scope);
    let mut excluded = ours.excluded;
    excluded += theirs.excluded;
    Measured::ratio(
        ours.count_where(is_successful_defensive_action) as f64,
        theirs.len() as f64,
        excluded,
    )
}

fn pressure_to_interception_ratio<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let pressures = fcx.ours_in_band(scope, &[EventKind::Pressure]);
    let interceptions = fcx.ours_in_band(scope, &[EventKind::Interception]);
    let mut excluded = pressures.excluded;
    excluded += interceptions.excluded;
    Measured::ratio(
        pressures.len() as f64,
        interceptions.len() as f64,
        excluded,
    )
}

#[cfg(test)]
mod tests {
    use crate::analysis::features::fixtures::*;
    use crate::models::{DuelOutcome, DuelType, EventKind, FeatureValue, InterceptionOutcome};

    fn stream() -> Vec<crate::models::Event> {
        vec![
            ev(1, 0.0, EventKind::Pass, THEM, THEM, 1).with_location(50.0, 40.0),
            ev(2, 1.0, EventKind::Pressure, US, THEM, 1).with_location(52.0, 40.0),
            ev(3, 2.0, EventKind::Interception, US, THEM, 1)
                .with_location(55.0, 40.0)
                .with_details(interception_details(InterceptionOutcome::SuccessInPlay)),
            ev(4, 3.0, EventKind::BallRecovery, US, US, 2).with_location(56.0, 20.0),
            ev(5, 10.0, EventKind::Pass, THEM, THEM, 3).with_location(60.0, 70.0),
            ev(6, 11.0, EventKind::Interception, US, THEM, 3)
                .with_location(62.0, 70.0)
                .with_details(interception_details(InterceptionOutcome::Lost)),
            // Missing location: excluded from band features
            ev(7, 12.0, EventKind::Interception, US, THEM, 3),
            ev(8, 13.0, EventKind::Duel, US, THEM, 3)
                .with_location(64.0, 10.0)
                .with_details(duel_details(DuelType::Aerial, DuelOutcome::Won)),
            ev(9, 14.0, EventKind::Duel, US, THEM, 3)
                .with_location(70.0, 30.0)
                .with_details(duel_details(DuelType::Tackle, DuelOutcome::Lost)),
        ]
    }

    #[test]
    fn test_interception_counts_and_rates() {
        let fx = Fixture::new(stream());
        let total = fx.measure("interceptions_total");
        assert_value(total.value, 2.0);
        assert_eq!(total.excluded.missing_location, 1);

        // Two opponent possessions (1 and 3)
        assert_value(fx.value("interceptions_per_opp_possession"), 1.0);
        assert_value(fx.value("interception_success_rate"), 0.5);
        assert_value(fx.value("interceptions_central"), 1.0);
        assert_value(fx.value("interceptions_wide"), 1.0);
    }

    #[test]
    fn test_recoveries() {
        let fx = Fixture::new(stream());
        assert_value(fx.value("recoveries_total"), 1.0);
        assert_value(fx.value("recovery_success_rate"), 1.0);
        assert_value(fx.value("recoveries_after_pressure"), 1.0);
        assert_value(fx.value("recovery_x_mean"), 56.0);
    }

    #[test]
    fn test_duels() {
        let fx = Fixture::new(stream());
        assert_value(fx.value("duels_total"), 2.0);
        assert_value(fx.value("duel_win_rate"), 0.5);
        assert_value(fx.value("aerial_duels_won"), 1.0);
        assert_value(fx.value("ground_duels_won"), 0.0);
        assert_value(fx.value("duel_x_mean"), 67.0);
        assert_value(fx.value("duel_x_std"), 3.0);
    }

    #[test]
    fn test_empty_scope_rates_undefined() {
        let fx = Fixture::new(vec![ev(1, 0.0, EventKind::Pass, US, US, 1)]);
        assert_eq!(fx.value("interceptions_per_opp_possession"), FeatureValue::Undefined);
        assert_eq!(fx.value("duel_x_mean"), FeatureValue::Undefined);
        assert_value(fx.value("interceptions_total"), 0.0);
    }

    #[test]
    fn test_efficiency_ratios() {
        let fx = Fixture::new(stream());
        // Successful: interception 3, recovery 4, aerial duel 8; opponent events in band: 1, 5
        assert_value(fx.value("defensive_action_efficiency"), 1.5);
        assert_value(fx.value("pressure_to_interception_ratio"), 0.5);
    }
}
