//! Carrying features: opponent carries in and across the target band.

use super::{mean, Category, FeatureContext, FeatureDef, Measured, Scope, TEAM_LEVELS};
use crate::analysis::predicates::{forward_gain, is_defensive_action, is_progressive_carry_cfg, Subset};
use crate::config::ExtractionConfig;
use crate::models::{Event, EventKind, Location};

const CAT: Category = Category::Carrying;

pub(super) fn register(defs: &mut Vec<FeatureDef>, _config: &ExtractionConfig) {
    defs.extend([
        FeatureDef::simple("carries_allowed", CAT, TEAM_LEVELS, carries_allowed),
        FeatureDef::simple("carries_interrupted", CAT, TEAM_LEVELS, carries_interrupted),
        FeatureDef::simple("carry_distance_mean", CAT, TEAM_LEVELS, carry_distance_mean),
        FeatureDef::simple("carries_entering_region", CAT, TEAM_LEVELS, carries_entering_region),
        FeatureDef::simple("carries_exiting_region", CAT, TEAM_LEVELS, carries_exiting_region),
        FeatureDef::simple("carries_through_region", CAT, TEAM_LEVELS, carries_through_region),
        FeatureDef::simple("carry_progression_mean", CAT, TEAM_LEVELS, carry_progression_mean),
        FeatureDef::simple("progressive_carries", CAT, TEAM_LEVELS, progressive_carries),
        FeatureDef::simple("carries_forward", CAT, TEAM_LEVELS, carries_forward),
        FeatureDef::simple("carries_lateral", CAT, TEAM_LEVELS, carries_lateral),
        FeatureDef::simple("carries_central", CAT, TEAM_LEVELS, carries_central),
        FeatureDef::simple("carries_wide", CAT, TEAM_LEVELS, carries_wide),
    ]);
}

fn band_carries<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Subset<'a> {
    fcx.opp_kind_in_band(scope, EventKind::Carry)
}

fn ends(e: &Event) -> Option<(Location, Location)> {
    Some((e.location?, e.carry()?.end_location?))
}

/// Located opponent carries matching a condition on both ends and the band range.
fn located_carries_where<'a>(
    scope: &Scope<'a>,
    fcx: &FeatureContext<'a>,
    pred: fn(Location, Location, (f64, f64)) -> bool,
) -> Measured {
    let band = fcx.ctx.classifier.target_range();
    let s = fcx.opp_kind_located(scope, EventKind::Carry);
    let n = s.count_where(|e| ends(e).is_some_and(|(a, b)| pred(a, b, band)));
    Measured::count(n, s.excluded)
}

fn carries_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&band_carries(scope, fcx))
}

/// Band carries answered by one of our defensive actions within the window.
fn carries_interrupted<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let window = fcx.config().windows.carry_interruption_s;
    let us = fcx.ctx.target_team();
    let timeline = fcx.stream_timeline();
    let s = band_carries(scope, fcx);
    let n = s.count_where(|carry| {
        timeline.position_of(carry.index).is_some_and(|pos| {
            timeline.occurred_within(pos, window, |e| {
                e.team_id == us && is_defensive_action(e)
            })
        })
    });
    Measured::count(n, s.excluded)
}

fn carry_distance_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = band_carries(scope, fcx);
    let distances: Vec<f64> = s
        .events
        .iter()
        .filter_map(|e| ends(e).map(|(a, b)| a.distance_to(&b)))
        .collect();
    Measured::option(mean(&distances), s.excluded)
}

fn carries_entering_region<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_carries_where(scope, fcx, |a, b, (lo, _)| a.x < lo && b.x >= lo)
}

fn carries_exiting_region<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (_, hi) = fcx.ctx.classifier.target_range();
    let s = band_carries(scope, fcx);
    let n = s.count_where(|e| ends(e).is_some_and(|(_, b)| b.x > hi));
    Measured::count(n, s.excluded)
}

/// Carries that start before the band and end beyond it.
pub(super) fn carries_through_region<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_carries_where(scope, fcx, |a, b, (lo, hi)| a.x < lo && b.x > hi)
}

fn carry_progression_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = band_carries(scope, fcx);
    let gains: Vec<f64> = s.events.iter().filter_map(|e| forward_gain(e)).collect();
    Measured::option(mean(&gains), s.excluded)
}

fn progressive_carries<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = band_carries(scope, fcx);
    Measured::count(
        s.count_where(|e| is_progressive_carry_cfg(fcx.ctx, e)),
        s.excluded,
    )
}

fn carries_forward<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = band_carries(scope, fcx);
    let n = s.count_where(|e| ends(e).is_some_and(|(a, b)| b.x > a.x));
    Measured::count(n, s.excluded)
}

fn carries_lateral<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = band_carries(scope, fcx);
    let n = s.count_where(|e| {
        ends(e).is_some_and(|(a, b)| (b.y - a.y).abs() > (b.x - a.x).abs())
    });
    Measured::count(n, s.excluded)
}

fn carries_by_lane<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>, wide: bool) -> Measured {
    let s = band_carries(scope, fcx);
    let n = s.count_where(|e| fcx.lane_of(e).is_some_and(|l| l.is_wide() == wide));
    Measured::count(n, s.excluded)
}

fn carries_central<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    carries_by_lane(scope, fcx, false)
}

fn carries_wide<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    carries_by_lane(scope, fcx, true)
}

#[cfg(test)]
mod tests {
    use crate::analysis::features::fixtures::*;
    use crate::models::{Event, EventKind, FeatureValue};

    fn carry(index: u64, t: f64, start: (f64, f64), end: (f64, f64)) -> Event {
        ev(index, t, EventKind::Carry, THEM, THEM, 1)
            .with_location(start.0, start.1)
            .with_details(carry_details(end))
    }

    fn stream() -> Vec<Event> {
        vec![
            // Progressive, central; interrupted 1.5 s later
            carry(1, 0.0, (50.0, 40.0), (65.0, 40.0)),
            ev(2, 1.5, EventKind::Duel, US, THEM, 1).with_location(65.0, 40.0),
            // Lateral, wide
            carry(3, 5.0, (60.0, 10.0), (62.0, 30.0)),
            // Exits the band; our block comes too late
            carry(4, 10.0, (75.0, 40.0), (90.0, 40.0)),
            ev(5, 13.0, EventKind::Block, US, THEM, 1).with_location(90.0, 40.0),
            // Enters the band from the defensive third
            carry(6, 20.0, (30.0, 40.0), (45.0, 40.0)),
            // Crosses the whole band
            carry(7, 25.0, (35.0, 40.0), (85.0, 40.0)),
        ]
    }

    #[test]
    fn test_band_carries() {
        let fx = Fixture::new(stream());
        assert_value(fx.value("carries_allowed"), 3.0);
        assert_value(fx.value("carries_interrupted"), 1.0);
        assert_value(fx.value("carries_exiting_region"), 1.0);
        assert_value(fx.value("progressive_carries"), 2.0);
        assert_value(fx.value("carries_forward"), 3.0);
        assert_value(fx.value("carries_lateral"), 1.0);
        assert_value(fx.value("carries_central"), 2.0);
        assert_value(fx.value("carries_wide"), 1.0);
        assert_value(fx.value("carry_progression_mean"), (15.0 + 2.0 + 15.0) / 3.0);
        let lateral = (2.0f64.powi(2) + 20.0f64.powi(2)).sqrt();
        assert_value(fx.value("carry_distance_mean"), (15.0 + lateral + 15.0) / 3.0);
    }

    #[test]
    fn test_region_crossings_use_all_located_carries() {
        let fx = Fixture::new(stream());
        assert_value(fx.value("carries_entering_region"), 2.0);
        assert_value(fx.value("carries_through_region"), 1.0);
    }

    #[test]
    fn test_carry_without_end_has_no_distance() {
        let fx = Fixture::new(vec![
            ev(1, 0.0, EventKind::Carry, THEM, THEM, 1).with_location(50.0, 40.0),
        ]);
        assert_value(fx.value("carries_allowed"), 1.0);
        assert_eq!(fx.value("carry_distance_mean"), FeatureValue::Undefined);
        assert_value(fx.value("carries_forward"), 0.0);
    }
}
