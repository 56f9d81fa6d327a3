//! Pressure and tempo on opponent possession in the target band.

use std::collections::BTreeMap;

use super::{
    mean, Category, FeatureContext, FeatureDef, Measured, Scope, DEFENSIVE_ACTIONS, TEAM_LEVELS,
};
use crate::analysis::predicates::{is_under_pressure, Subset};
use crate::analysis::windows::Timeline;
use crate::analysis::zones::Lane;
use crate::config::ExtractionConfig;
use crate::models::{Event, EventKind, PossessionKey};

const CAT: Category = Category::Pressure;

pub(super) fn register(defs: &mut Vec<FeatureDef>, config: &ExtractionConfig) {
    defs.extend([
        FeatureDef::simple(
            "opp_events_under_pressure",
            CAT,
            TEAM_LEVELS,
            opp_events_under_pressure,
        ),
        FeatureDef::simple("pressured_share", CAT, TEAM_LEVELS, pressured_share),
        FeatureDef::simple("pressure_per_minute", CAT, TEAM_LEVELS, pressure_per_minute),
        FeatureDef::simple(
            "time_to_first_pressure_mean",
            CAT,
            TEAM_LEVELS,
            time_to_first_pressure_mean,
        ),
        FeatureDef::simple("pressure_left", CAT, TEAM_LEVELS, pressure_left),
        FeatureDef::simple("pressure_central", CAT, TEAM_LEVELS, pressure_central),
        FeatureDef::simple("pressure_right", CAT, TEAM_LEVELS, pressure_right),
        FeatureDef::simple("pressure_on_passes", CAT, TEAM_LEVELS, pressure_on_passes),
        FeatureDef::simple("pressure_on_receipts", CAT, TEAM_LEVELS, pressure_on_receipts),
        FeatureDef::simple("reaction_time_mean", CAT, TEAM_LEVELS, reaction_time_mean),
        FeatureDef::simple(
            "pressure_persistence_mean",
            CAT,
            TEAM_LEVELS,
            pressure_persistence_mean,
        ),
        FeatureDef::windowed(
            "pressing_intensity".to_string(),
            CAT,
            TEAM_LEVELS,
            pressing_intensity,
            config.windows.pressing_intensity_s,
        ),
        FeatureDef::windowed(
            "immediate_pressure_rate".to_string(),
            CAT,
            TEAM_LEVELS,
            immediate_pressure_rate,
            config.windows.immediate_pressure_s,
        ),
    ]);

    for window in &config.windows.pressure_windows_s {
        defs.push(FeatureDef::windowed(
            format!("pressure_within_{}s", window),
            CAT,
            TEAM_LEVELS,
            pressure_within,
            *window,
        ));
    }
}

fn pressured<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Subset<'a> {
    let mut s = fcx.opp_in_band(scope);
    s.events.retain(|e| is_under_pressure(e));
    s
}

fn opp_events_under_pressure<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&pressured(scope, fcx))
}

fn pressured_share<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let all = fcx.opp_in_band(scope);
    let n = all.count_where(is_under_pressure);
    Measured::ratio(n as f64, all.len() as f64, all.excluded)
}

fn pressure_per_minute<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = pressured(scope, fcx);
    Measured::ratio(
        s.len() as f64,
        scope.duration_minutes.unwrap_or(0.0),
        s.excluded,
    )
}

/// Pressured opponent events within `window_s` of their possession start.
fn pressure_within<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>, window_s: f64) -> Measured {
    let s = pressured(scope, fcx);
    let n = s
        .events
        .iter()
        .filter(|e| fcx.elapsed_in_possession(e).is_some_and(|dt| dt <= window_s))
        .count();
    Measured::count(n, s.excluded)
}

fn immediate_pressure_rate<'a>(
    scope: &Scope<'a>,
    fcx: &FeatureContext<'a>,
    window_s: f64,
) -> Measured {
    let all = fcx.opp_in_band(scope);
    let n = all
        .events
        .iter()
        .filter(|e| is_under_pressure(e))
        .filter(|e| fcx.elapsed_in_possession(e).is_some_and(|dt| dt <= window_s))
        .count();
    Measured::ratio(n as f64, all.len() as f64, all.excluded)
}

/// Pressured events grouped by possession, in stream order.
fn pressured_by_possession<'a>(
    s: &Subset<'a>,
    fcx: &FeatureContext<'a>,
) -> BTreeMap<PossessionKey, Vec<&'a Event>> {
    let mut groups: BTreeMap<PossessionKey, Vec<&'a Event>> = BTreeMap::new();
    for e in &s.events {
        if let Some(p) = fcx.possession_of(e) {
            groups.entry(p.key).or_default().push(*e);
        }
    }
    groups
}

fn time_to_first_pressure_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = pressured(scope, fcx);
    let firsts: Vec<f64> = pressured_by_possession(&s, fcx)
        .values()
        .filter_map(|events| events.first())
        .filter_map(|e| fcx.elapsed_in_possession(e))
        .collect();
    Measured::option(mean(&firsts), s.excluded)
}

/// Span between the first and last pressured event of each possession.
fn pressure_persistence_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = pressured(scope, fcx);
    let spans: Vec<f64> = pressured_by_possession(&s, fcx)
        .values()
        .filter(|events| events.len() > 1)
        .filter_map(|events| {
            let first = events.first()?;
            let last = events.last()?;
            fcx.ctx.clock.elapsed(first, last)
        })
        .collect();
    Measured::option(mean(&spans), s.excluded)
}

fn pressure_in_lane<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>, lane: Lane) -> Measured {
    let s = pressured(scope, fcx);
    let n = s
        .events
        .iter()
        .filter(|e| fcx.lane_of(e) == Some(lane))
        .count();
    Measured::count(n, s.excluded)
}

fn pressure_left<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    pressure_in_lane(scope, fcx, Lane::Left)
}

fn pressure_central<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    pressure_in_lane(scope, fcx, Lane::Central)
}

fn pressure_right<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    pressure_in_lane(scope, fcx, Lane::Right)
}

fn pressure_on_passes<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.opp_kind_in_band(scope, EventKind::Pass);
    Measured::count(s.count_where(is_under_pressure), s.excluded)
}

fn pressure_on_receipts<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.opp_kind_in_band(scope, EventKind::BallReceipt);
    Measured::count(s.count_where(is_under_pressure), s.excluded)
}

/// Time from each opponent event to our next defensive action in the band,
/// within the same possession.
fn reaction_time_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let opp = fcx.opp_in_band(scope);
    let us = fcx.ctx.target_team();
    let band = fcx.ctx.config.zones.target_band;
    let responds = |e: &Event| {
        e.team_id == us
            && DEFENSIVE_ACTIONS.contains(&e.kind)
            && e
                .location
                .and_then(|l| fcx.ctx.classifier.classify_third(&l).ok())
                == Some(band)
    };

    let times: Vec<f64> = opp
        .events
        .iter()
        .filter_map(|e| {
            let (timeline, pos) = fcx.possession_timeline(e)?;
            timeline.reaction_time(pos, responds)
        })
        .collect();
    Measured::option(mean(&times), opp.excluded)
}

/// Events per second over the opening window of each opponent possession.
fn pressing_intensity<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>, window_s: f64) -> Measured {
    let rates: Vec<f64> = scope
        .opponent_possessions(fcx.ctx)
        .into_iter()
        .filter_map(|p| {
            let timeline = Timeline::new(&p.events, &fcx.ctx.clock);
            let opening: Vec<f64> = (0..p.events.len())
                .map_while(|pos| timeline.elapsed_since_start(pos))
                .take_while(|dt| *dt <= window_s)
                .collect();
            let span = opening.last().copied()?;
            (span > 0.0).then(|| opening.len() as f64 / span)
        })
        .collect();
    Measured::option(mean(&rates), Default::default())
}
