//! # Spatial and compactness features
//!
//! Shape of our defensive actions inside the target band.
//!
//! ## Measures
//! | Feature | Definition |
//! |---------|------------|
//! | defensive_width_mean | mean over possessions of max y − min y |
//! | defensive_depth_mean | mean over possessions of max x − min x |
//! | compactness_index | width mean / depth mean |
//! | zone_balance | population std of the left/central/right counts |
//! | coverage_gaps | grid cells below `coverage_gap_fraction` × mean cell count |
//! | defensive_clustering | 1 / (mean nearest-neighbour distance + ε) |

use std::collections::BTreeMap;

use super::{
    mean, population_std, xs, ys, Category, FeatureContext, FeatureDef, Measured, Scope,
    DEFENSIVE_ACTIONS, TEAM_LEVELS,
};
use crate::analysis::predicates::Subset;
use crate::analysis::zones::Lane;
use crate::config::ExtractionConfig;
use crate::models::{FeatureValue, Location, PossessionKey};

const CAT: Category = Category::Spatial;

/// Keeps the clustering score finite when points coincide.
const CLUSTER_EPSILON: f64 = 1e-6;

pub(super) fn register(defs: &mut Vec<FeatureDef>, _config: &ExtractionConfig) {
    defs.extend([
        FeatureDef::simple("defensive_width_mean", CAT, TEAM_LEVELS, defensive_width_mean),
        FeatureDef::simple("defensive_depth_mean", CAT, TEAM_LEVELS, defensive_depth_mean),
        FeatureDef::simple("compactness_index", CAT, TEAM_LEVELS, compactness_index),
        FeatureDef::simple("central_concentration", CAT, TEAM_LEVELS, central_concentration),
        FeatureDef::simple(
            "defensive_actions_per_possession",
            CAT,
            TEAM_LEVELS,
            defensive_actions_per_possession,
        ),
        FeatureDef::simple("coverage_left", CAT, TEAM_LEVELS, coverage_left),
        FeatureDef::simple("coverage_central", CAT, TEAM_LEVELS, coverage_central),
        FeatureDef::simple("coverage_right", CAT, TEAM_LEVELS, coverage_right),
        FeatureDef::simple("zone_balance", CAT, TEAM_LEVELS, zone_balance),
        FeatureDef::simple("coverage_gaps", CAT, TEAM_LEVELS, coverage_gaps),
        FeatureDef::simple("defensive_actions_x_mean", CAT, TEAM_LEVELS, x_mean),
        FeatureDef::simple("defensive_actions_x_std", CAT, TEAM_LEVELS, x_std),
        FeatureDef::simple("defensive_actions_y_mean", CAT, TEAM_LEVELS, y_mean),
        FeatureDef::simple("defensive_actions_y_std", CAT, TEAM_LEVELS, y_std),
        FeatureDef::simple("defensive_clustering", CAT, TEAM_LEVELS, defensive_clustering),
    ]);
}

fn actions<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Subset<'a> {
    fcx.ours_in_band(scope, DEFENSIVE_ACTIONS)
}

fn points(subset: &Subset) -> Vec<Location> {
    subset.events.iter().filter_map(|e| e.location).collect()
}

/// (width, depth) spans of the actions of each possession.
fn spans_by_possession<'a>(subset: &Subset<'a>, fcx: &FeatureContext<'a>) -> Vec<(f64, f64)> {
    let mut groups: BTreeMap<Option<PossessionKey>, Vec<Location>> = BTreeMap::new();
    for e in &subset.events {
        if let Some(loc) = e.location {
            groups
                .entry(fcx.possession_of(e).map(|p| p.key))
                .or_default()
                .push(loc);
        }
    }
    groups
        .values()
        .map(|pts| (extent(&ys(pts)), extent(&xs(pts))))
        .collect()
}

fn extent(values: &[f64]) -> f64 {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    hi - lo
}

fn width_and_depth<'a>(
    scope: &Scope<'a>,
    fcx: &FeatureContext<'a>,
) -> (Option<f64>, Option<f64>, Subset<'a>) {
    let s = actions(scope, fcx);
    let spans = spans_by_possession(&s, fcx);
    let widths: Vec<f64> = spans.iter().map(|(w, _)| *w).collect();
    let depths: Vec<f64> = spans.iter().map(|(_, d)| *d).collect();
    (mean(&widths), mean(&depths), s)
}

fn defensive_width_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (width, _, s) = width_and_depth(scope, fcx);
    Measured::option(width, s.excluded)
}

fn defensive_depth_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (_, depth, s) = width_and_depth(scope, fcx);
    Measured::option(depth, s.excluded)
}

fn compactness_index<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    match width_and_depth(scope, fcx) {
        (Some(w), Some(d), s) => Measured::ratio(w, d, s.excluded),
        (_, _, s) => Measured::new(FeatureValue::Undefined, s.excluded),
    }
}

fn lane_counts<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> ([usize; 3], Subset<'a>) {
    let s = actions(scope, fcx);
    let mut counts = [0usize; 3];
    for e in &s.events {
        if let Some(lane) = fcx.lane_of(e) {
            let slot = match lane {
                Lane::Left => 0,
                Lane::Central => 1,
                Lane::Right => 2,
            };
            counts[slot] += 1;
        }
    }
    (counts, s)
}

fn central_concentration<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (counts, s) = lane_counts(scope, fcx);
    Measured::ratio(counts[1] as f64, s.len() as f64, s.excluded)
}

fn defensive_actions_per_possession<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = actions(scope, fcx);
    let possessions = scope.opponent_possessions(fcx.ctx).len();
    Measured::ratio(s.len() as f64, possessions as f64, s.excluded)
}

fn coverage_left<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (counts, s) = lane_counts(scope, fcx);
    Measured::count(counts[0], s.excluded)
}

fn coverage_central<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (counts, s) = lane_counts(scope, fcx);
    Measured::count(counts[1], s.excluded)
}

fn coverage_right<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (counts, s) = lane_counts(scope, fcx);
    Measured::count(counts[2], s.excluded)
}

fn zone_balance<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (counts, s) = lane_counts(scope, fcx);
    if s.is_empty() {
        return Measured::new(FeatureValue::Undefined, s.excluded);
    }
    let values = counts.map(|c| c as f64);
    Measured::option(population_std(&values), s.excluded)
}

fn coverage_gaps<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = actions(scope, fcx);
    let zones = fcx.ctx.classifier.config();
    let n = zones.coverage_grid_cells;
    let mut grid = vec![0usize; n * n];
    for loc in points(&s) {
        if let Ok(Some((col, row))) = fcx.ctx.classifier.coverage_cell(&loc) {
            if let Some(cell) = grid.get_mut(row * n + col) {
                *cell += 1;
            }
        }
    }
    let total: usize = grid.iter().sum();
    if total == 0 || grid.is_empty() {
        return Measured::new(FeatureValue::Undefined, s.excluded);
    }
    let cell_mean = total as f64 / grid.len() as f64;
    let threshold = cell_mean * zones.coverage_gap_fraction;
    let gaps = grid.iter().filter(|&&c| (c as f64) < threshold).count();
    Measured::count(gaps, s.excluded)
}

fn located_stat<'a>(
    scope: &Scope<'a>,
    fcx: &FeatureContext<'a>,
    axis: fn(&[Location]) -> Vec<f64>,
    reduce: fn(&[f64]) -> Option<f64>,
) -> Measured {
    let s = actions(scope, fcx);
    Measured::option(reduce(&axis(&points(&s))), s.excluded)
}

fn x_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_stat(scope, fcx, xs, mean)
}

fn x_std<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_stat(scope, fcx, xs, population_std)
}

fn y_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_stat(scope, fcx, ys, mean)
}

fn y_std<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    located_stat(scope, fcx, ys, population_std)
}

/// Mean distance from each point to its nearest neighbour.
fn mean_nearest_neighbour(pts: &[Location]) -> Option<f64> {
    if pts.len() < 2 {
        return None;
    }
    let nearest: Vec<f64> = pts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            pts.iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, q)| p.distance_to(q))
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    mean(&nearest)
}

fn defensive_clustering<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = actions(scope, fcx);
    let value = mean_nearest_neighbour(&points(&s)).map(|d| 1.0 / (d + CLUSTER_EPSILON));
    Measured::option(value, s.excluded)
}
