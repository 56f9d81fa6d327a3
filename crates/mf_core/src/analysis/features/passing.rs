//! Passing features: what the opponent completes from inside the target
//! band, and how long its pass chains run before we break them.
//!
//! Direction features need both ends of the pass; passes without an end
//! location simply do not qualify. Chain features run over whole opponent
//! possessions rather than band events.

use super::{mean, Category, FeatureContext, FeatureDef, Measured, Scope, TEAM_LEVELS};
use crate::analysis::predicates::{is_completed_pass, travel_length, EventFilter, Located, Subset};
use crate::analysis::zones::Third;
use crate::config::ExtractionConfig;
use crate::models::{Event, EventKind, Exclusions, Location, PassOutcome, Possession};

const CAT: Category = Category::Passing;

pub(super) fn register(defs: &mut Vec<FeatureDef>, _config: &ExtractionConfig) {
    defs.extend([
        FeatureDef::simple("passes_allowed", CAT, TEAM_LEVELS, passes_allowed),
        FeatureDef::simple("passes_intercepted", CAT, TEAM_LEVELS, passes_intercepted),
        FeatureDef::simple(
            "pass_completion_rate_allowed",
            CAT,
            TEAM_LEVELS,
            pass_completion_rate_allowed,
        ),
        FeatureDef::simple("passes_forward", CAT, TEAM_LEVELS, passes_forward),
        FeatureDef::simple("passes_backward", CAT, TEAM_LEVELS, passes_backward),
        FeatureDef::simple("passes_lateral", CAT, TEAM_LEVELS, passes_lateral),
        FeatureDef::simple("pass_length_mean_allowed", CAT, TEAM_LEVELS, pass_length_mean_allowed),
        FeatureDef::simple("long_passes_allowed", CAT, TEAM_LEVELS, long_passes_allowed),
        FeatureDef::simple(
            "passes_before_interception_mean",
            CAT,
            TEAM_LEVELS,
            passes_before_interception_mean,
        ),
        FeatureDef::simple("consecutive_passes_mean", CAT, TEAM_LEVELS, consecutive_passes_mean),
        FeatureDef::simple(
            "pass_sequence_length_mean",
            CAT,
            TEAM_LEVELS,
            pass_sequence_length_mean,
        ),
        FeatureDef::simple("pass_chain_break_rate", CAT, TEAM_LEVELS, pass_chain_break_rate),
        FeatureDef::simple("passes_left_to_right", CAT, TEAM_LEVELS, passes_left_to_right),
        FeatureDef::simple("passes_right_to_left", CAT, TEAM_LEVELS, passes_right_to_left),
        FeatureDef::simple("passes_center_to_wide", CAT, TEAM_LEVELS, passes_center_to_wide),
        FeatureDef::simple("passes_wide_to_center", CAT, TEAM_LEVELS, passes_wide_to_center),
        FeatureDef::simple(
            "passes_defensive_to_final",
            CAT,
            TEAM_LEVELS,
            passes_defensive_to_final,
        ),
    ]);
}

fn band_passes<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Subset<'a> {
    fcx.opp_kind_in_band(scope, EventKind::Pass)
}

/// (start, end) of a pass with both ends recorded.
fn ends(e: &Event) -> Option<(Location, Location)> {
    Some((e.location?, e.pass()?.end_location?))
}

fn count_by_ends<'a>(
    scope: &Scope<'a>,
    fcx: &FeatureContext<'a>,
    pred: fn(Location, Location) -> bool,
) -> Measured {
    let s = band_passes(scope, fcx);
    let n = s.count_where(|e| ends(e).is_some_and(|(a, b)| pred(a, b)));
    Measured::count(n, s.excluded)
}

fn passes_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&band_passes(scope, fcx))
}

fn passes_intercepted<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = band_passes(scope, fcx);
    let n = s.count_where(|e| {
        matches!(
            e.pass().and_then(|p| p.outcome),
            Some(PassOutcome::Incomplete | PassOutcome::Out | PassOutcome::Blocked)
        )
    });
    Measured::count(n, s.excluded)
}

fn pass_completion_rate_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = band_passes(scope, fcx);
    Measured::ratio(
        s.count_where(is_completed_pass) as f64,
        s.len() as f64,
        s.excluded,
    )
}

fn passes_forward<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    count_by_ends(scope, fcx, |a, b| b.x > a.x)
}

fn passes_backward<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    count_by_ends(scope, fcx, |a, b| b.x < a.x)
}

fn passes_lateral<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    count_by_ends(scope, fcx, |a, b| (b.y - a.y).abs() > (b.x - a.x).abs())
}

fn passes_left_to_right<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    count_by_ends(scope, fcx, |a, b| b.y > a.y)
}

fn passes_right_to_left<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    count_by_ends(scope, fcx, |a, b| b.y < a.y)
}

fn pass_length_mean_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = band_passes(scope, fcx);
    let lengths: Vec<f64> = s.events.iter().filter_map(|e| travel_length(e)).collect();
    Measured::option(mean(&lengths), s.excluded)
}

fn long_passes_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let threshold = fcx.config().progressive.long_pass_length;
    let s = band_passes(scope, fcx);
    let n = s.count_where(|e| travel_length(e).is_some_and(|l| l > threshold));
    Measured::count(n, s.excluded)
}

/// Lane change between the two ends of a band pass.
fn lane_change<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>, from_wide: bool) -> Measured {
    let s = band_passes(scope, fcx);
    let mut excluded = s.excluded;
    let mut n = 0;
    for e in &s.events {
        let Some(start) = fcx.lane_of(e) else {
            continue;
        };
        match fcx.ctx.locate_end(e) {
            Located::At(_, end) => {
                if start.is_wide() == from_wide && end.lane.is_wide() != from_wide {
                    n += 1;
                }
            }
            // Passes without an end are not lane changes
            Located::Missing => {}
            Located::OutOfRange => excluded.out_of_range += 1,
        }
    }
    Measured::count(n, excluded)
}

fn passes_center_to_wide<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    lane_change(scope, fcx, false)
}

fn passes_wide_to_center<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    lane_change(scope, fcx, true)
}

/// Located opponent passes from the defensive third to the final third.
fn passes_defensive_to_final<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = EventFilter::opponent_events()
        .kind(EventKind::Pass)
        .in_thirds(&[Third::Defensive])
        .apply(fcx.ctx, scope.events.iter().copied());
    let mut excluded = s.excluded;
    let mut n = 0;
    for e in &s.events {
        match fcx.ctx.locate_end(e) {
            Located::At(_, zone) if zone.third == Third::Final => n += 1,
            Located::OutOfRange => excluded.out_of_range += 1,
            _ => {}
        }
    }
    Measured::count(n, excluded)
}

// Pass chains

/// Opponent passes of a possession and how many came before our first interception.
struct Chain {
    passes: usize,
    before_interception: Option<usize>,
}

fn chain(possession: &Possession, fcx: &FeatureContext) -> Chain {
    let us = fcx.ctx.target_team();
    let mut passes = 0;
    let mut before_interception = None;
    for e in &possession.events {
        if e.kind == EventKind::Interception && e.team_id == us && before_interception.is_none() {
            before_interception = Some(passes);
        }
        if e.kind == EventKind::Pass && e.team_id != us {
            passes += 1;
        }
    }
    Chain {
        passes,
        before_interception,
    }
}

fn opponent_chains<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Vec<Chain> {
    scope
        .opponent_possessions(fcx.ctx)
        .into_iter()
        .map(|p| chain(p, fcx))
        .collect()
}

fn passes_before_interception_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let counts: Vec<f64> = opponent_chains(scope, fcx)
        .iter()
        .filter_map(|c| c.before_interception.map(|n| n as f64))
        .collect();
    Measured::option(mean(&counts), Exclusions::default())
}

/// Passes the opponent strings together before a break, per possession.
fn consecutive_passes_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let counts: Vec<f64> = opponent_chains(scope, fcx)
        .iter()
        .map(|c| c.before_interception.unwrap_or(c.passes) as f64)
        .collect();
    Measured::option(mean(&counts), Exclusions::default())
}

fn pass_sequence_length_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let counts: Vec<f64> = opponent_chains(scope, fcx)
        .iter()
        .filter(|c| c.passes > 0)
        .map(|c| c.passes as f64)
        .collect();
    Measured::option(mean(&counts), Exclusions::default())
}

/// Share of opponent possessions whose passing continued past our interception.
fn pass_chain_break_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let chains = opponent_chains(scope, fcx);
    let broken = chains
        .iter()
        .filter(|c| c.before_interception.is_some_and(|n| n < c.passes))
        .count();
    Measured::ratio(broken as f64, chains.len() as f64, Exclusions::default())
}
