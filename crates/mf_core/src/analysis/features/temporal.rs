//! Temporal and context features, plus the per-possession descriptors that
//! populate possession-level records.

use std::collections::BTreeMap;

use super::{
    mean, Category, FeatureContext, FeatureDef, Measured, Scope, POSSESSION_LEVEL, TEAM_LEVELS,
};
use crate::analysis::predicates::{EventFilter, Subset};
use crate::config::ExtractionConfig;
use crate::models::{EventKind, Exclusions, FeatureValue, PlayPattern, Possession};

const CAT: Category = Category::Temporal;

pub(super) fn register(defs: &mut Vec<FeatureDef>, _config: &ExtractionConfig) {
    defs.extend([
        FeatureDef::simple("event_minute_mean", CAT, TEAM_LEVELS, event_minute_mean),
        FeatureDef::simple("dominant_period", CAT, TEAM_LEVELS, dominant_period),
        FeatureDef::simple(
            "time_since_last_goal_mean",
            CAT,
            TEAM_LEVELS,
            time_since_last_goal_mean,
        ),
        FeatureDef::simple("regular_play_events", CAT, TEAM_LEVELS, regular_play_events),
        FeatureDef::simple("set_piece_events", CAT, TEAM_LEVELS, set_piece_events),
        FeatureDef::simple("counter_attack_events", CAT, TEAM_LEVELS, counter_attack_events),
        FeatureDef::simple(
            "opp_possession_duration_mean",
            CAT,
            TEAM_LEVELS,
            opp_possession_duration_mean,
        ),
        FeatureDef::simple(
            "events_per_possession_mean",
            CAT,
            TEAM_LEVELS,
            events_per_possession_mean,
        ),
        FeatureDef::simple("possession_duration_s", CAT, POSSESSION_LEVEL, possession_duration_s),
        FeatureDef::simple("possession_event_count", CAT, POSSESSION_LEVEL, possession_event_count),
        FeatureDef::simple("possession_pass_count", CAT, POSSESSION_LEVEL, possession_pass_count),
        FeatureDef::simple("possession_start_x", CAT, POSSESSION_LEVEL, possession_start_x),
        FeatureDef::simple("possession_max_x", CAT, POSSESSION_LEVEL, possession_max_x),
        FeatureDef::simple("possession_pressures", CAT, POSSESSION_LEVEL, possession_pressures),
    ]);
}

/// Every located event in the band, either side.
fn band_events<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Subset<'a> {
    EventFilter::new()
        .in_target_band(fcx.ctx)
        .apply(fcx.ctx, scope.events.iter().copied())
}

fn event_minute_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = band_events(scope, fcx);
    let minutes: Vec<f64> = s
        .events
        .iter()
        .map(|e| fcx.ctx.clock.match_minute(e))
        .collect();
    Measured::option(mean(&minutes), s.excluded)
}

/// Most frequent period of band events; ties go to the earlier period.
fn dominant_period<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = band_events(scope, fcx);
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for e in &s.events {
        *counts.entry(e.period).or_default() += 1;
    }
    let mut best: Option<(u8, usize)> = None;
    for (period, n) in counts {
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((period, n));
        }
    }
    Measured::option(best.map(|(p, _)| f64::from(p)), s.excluded)
}

fn time_since_last_goal_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let timeline = fcx.stream_timeline();
    let s = band_events(scope, fcx);
    let gaps: Vec<f64> = s
        .events
        .iter()
        .filter_map(|e| {
            let pos = timeline.position_of(e.index)?;
            timeline.elapsed_since_previous(pos, |prior| prior.is_goal())
        })
        .collect();
    Measured::option(mean(&gaps), s.excluded)
}

fn count_patterns(scope: &Scope, pred: fn(PlayPattern) -> bool) -> Measured {
    let n = scope
        .events
        .iter()
        .filter(|e| e.play_pattern.is_some_and(pred))
        .count();
    Measured::count(n, Exclusions::default())
}

fn regular_play_events<'a>(scope: &Scope<'a>, _fcx: &FeatureContext<'a>) -> Measured {
    count_patterns(scope, |p| p == PlayPattern::RegularPlay)
}

fn set_piece_events<'a>(scope: &Scope<'a>, _fcx: &FeatureContext<'a>) -> Measured {
    count_patterns(scope, PlayPattern::is_set_piece)
}

fn counter_attack_events<'a>(scope: &Scope<'a>, _fcx: &FeatureContext<'a>) -> Measured {
    count_patterns(scope, |p| p == PlayPattern::FromCounter)
}

fn opp_possession_duration_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let durations: Vec<f64> = scope
        .opponent_possessions(fcx.ctx)
        .iter()
        .map(|p| p.duration_s())
        .collect();
    Measured::option(mean(&durations), Exclusions::default())
}

fn events_per_possession_mean<'a>(scope: &Scope<'a>, _fcx: &FeatureContext<'a>) -> Measured {
    let sizes: Vec<f64> = scope.possessions.iter().map(|p| p.len() as f64).collect();
    Measured::option(mean(&sizes), Exclusions::default())
}

// Possession-level descriptors

fn the_possession<'a>(scope: &Scope<'a>) -> Option<&'a Possession> {
    scope.possessions.first().copied()
}

fn describe(scope: &Scope, f: impl Fn(&Possession) -> Option<f64>) -> Measured {
    Measured::plain(FeatureValue::from_option(the_possession(scope).and_then(f)))
}

fn possession_duration_s<'a>(scope: &Scope<'a>, _fcx: &FeatureContext<'a>) -> Measured {
    describe(scope, |p| Some(p.duration_s()))
}

fn possession_event_count<'a>(scope: &Scope<'a>, _fcx: &FeatureContext<'a>) -> Measured {
    describe(scope, |p| Some(p.len() as f64))
}

fn possession_pass_count<'a>(scope: &Scope<'a>, _fcx: &FeatureContext<'a>) -> Measured {
    describe(scope, |p| {
        let passes = p.events.iter().filter(|e| e.kind == EventKind::Pass).count();
        Some(passes as f64)
    })
}

fn possession_start_x<'a>(scope: &Scope<'a>, _fcx: &FeatureContext<'a>) -> Measured {
    describe(scope, |p| p.start_location().map(|l| l.x))
}

fn possession_max_x<'a>(scope: &Scope<'a>, _fcx: &FeatureContext<'a>) -> Measured {
    describe(scope, Possession::max_x)
}

/// Our pressure events inside the possession.
fn possession_pressures<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let us = fcx.ctx.target_team();
    describe(scope, |p| {
        let n = p
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Pressure && e.team_id == us)
            .count();
        Some(n as f64)
    })
}
