//! Player and role features.
//!
//! Player-level features read the scope's own events (one player of ours)
//! restricted to the target band. The team-level ones describe how our
//! players spread across the band.

use std::collections::BTreeSet;

use super::{
    mean, population_std, xs, ys, Category, FeatureContext, FeatureDef, Measured, Scope,
    PLAYER_LEVEL, TEAM_LEVELS,
};
use crate::analysis::predicates::{is_won_duel, EventFilter, Side, Subset};
use crate::config::ExtractionConfig;
use crate::models::{EventKind, Location};

const CAT: Category = Category::Player;

pub(super) fn register(defs: &mut Vec<FeatureDef>, _config: &ExtractionConfig) {
    defs.extend([
        FeatureDef::simple("player_interceptions", CAT, PLAYER_LEVEL, player_interceptions),
        FeatureDef::simple("player_recoveries", CAT, PLAYER_LEVEL, player_recoveries),
        FeatureDef::simple("player_pressures", CAT, PLAYER_LEVEL, player_pressures),
        FeatureDef::simple("player_duels", CAT, PLAYER_LEVEL, player_duels),
        FeatureDef::simple("player_duel_win_rate", CAT, PLAYER_LEVEL, player_duel_win_rate),
        FeatureDef::simple("player_x_mean", CAT, PLAYER_LEVEL, player_x_mean),
        FeatureDef::simple("player_x_std", CAT, PLAYER_LEVEL, player_x_std),
        FeatureDef::simple("player_y_mean", CAT, PLAYER_LEVEL, player_y_mean),
        FeatureDef::simple("player_y_std", CAT, PLAYER_LEVEL, player_y_std),
        FeatureDef::simple("region_player_count", CAT, TEAM_LEVELS, region_player_count),
        FeatureDef::simple("width_utilization", CAT, TEAM_LEVELS, width_utilization),
        FeatureDef::simple("depth_utilization", CAT, TEAM_LEVELS, depth_utilization),
    ]);
}

/// All of our events in the band, any kind.
fn ours_in_band_all<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Subset<'a> {
    EventFilter::new()
        .actor(Side::Us)
        .in_target_band(fcx.ctx)
        .apply(fcx.ctx, scope.events.iter().copied())
}

fn band_points<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> (Vec<Location>, Subset<'a>) {
    let s = ours_in_band_all(scope, fcx);
    let points = s.events.iter().filter_map(|e| e.location).collect();
    (points, s)
}

fn player_interceptions<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&fcx.ours_in_band(scope, &[EventKind::Interception]))
}

fn player_recoveries<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&fcx.ours_in_band(scope, &[EventKind::BallRecovery]))
}

fn player_pressures<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&fcx.ours_in_band(scope, &[EventKind::Pressure]))
}

fn player_duels<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&fcx.ours_in_band(scope, &[EventKind::Duel]))
}

fn player_duel_win_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = fcx.ours_in_band(scope, &[EventKind::Duel]);
    Measured::ratio(s.count_where(is_won_duel) as f64, s.len() as f64, s.excluded)
}

fn player_x_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (points, s) = band_points(scope, fcx);
    Measured::option(mean(&xs(&points)), s.excluded)
}

fn player_x_std<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (points, s) = band_points(scope, fcx);
    Measured::option(population_std(&xs(&points)), s.excluded)
}

fn player_y_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (points, s) = band_points(scope, fcx);
    Measured::option(mean(&ys(&points)), s.excluded)
}

fn player_y_std<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (points, s) = band_points(scope, fcx);
    Measured::option(population_std(&ys(&points)), s.excluded)
}

/// Distinct players of ours with at least one band event.
fn region_player_count<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = ours_in_band_all(scope, fcx);
    let players: BTreeSet<_> = s.events.iter().filter_map(|e| e.player_id).collect();
    Measured::count(players.len(), s.excluded)
}

fn width_utilization<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (points, s) = band_points(scope, fcx);
    Measured::option(population_std(&ys(&points)), s.excluded)
}

fn depth_utilization<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let (points, s) = band_points(scope, fcx);
    Measured::option(mean(&xs(&points)), s.excluded)
}
