//! # Zone-transition features
//!
//! Opponent movement of the ball across the two x-cuts, and the
//! possession-level bypass summary.
//!
//! ## Cuts
//! | Transition | Start | End |
//! |------------|-------|-----|
//! | defensive → midfield | `x < defensive cut` | `x ≥ defensive cut` |
//! | midfield → final | `defensive cut ≤ x ≤ final cut` | `x > final cut` |
//!
//! Prevention at a cut is our interceptions inside the entry band around it
//! over the passes and carries that made it across, capped at 1.

use super::access;
use super::carrying::carries_through_region;
use super::{Category, FeatureContext, FeatureDef, Measured, Scope, TEAM_LEVELS};
use crate::analysis::bypass::BypassSummary;
use crate::analysis::predicates::{EventFilter, Side, Subset};
use crate::analysis::zones::Third;
use crate::config::ExtractionConfig;
use crate::models::{Event, EventKind, Exclusions, FeatureValue, Location};

const CAT: Category = Category::ZoneTransition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cut {
    DefensiveToMidfield,
    MidfieldToFinal,
}

impl Cut {
    fn x(self, fcx: &FeatureContext) -> f64 {
        let zones = &fcx.config().zones;
        match self {
            Cut::DefensiveToMidfield => zones.defensive_x_max,
            Cut::MidfieldToFinal => zones.final_x_min,
        }
    }

    fn crossed(self, fcx: &FeatureContext, start: Location, end: Location) -> bool {
        let zones = &fcx.config().zones;
        match self {
            Cut::DefensiveToMidfield => {
                start.x < zones.defensive_x_max && end.x >= zones.defensive_x_max
            }
            Cut::MidfieldToFinal => {
                (zones.defensive_x_max..=zones.final_x_min).contains(&start.x)
                    && end.x > zones.final_x_min
            }
        }
    }
}

pub(super) fn register(defs: &mut Vec<FeatureDef>, _config: &ExtractionConfig) {
    defs.extend([
        FeatureDef::simple(
            "def_to_mid_passes_allowed",
            CAT,
            TEAM_LEVELS,
            def_to_mid_passes_allowed,
        ),
        FeatureDef::simple(
            "def_to_mid_carries_allowed",
            CAT,
            TEAM_LEVELS,
            def_to_mid_carries_allowed,
        ),
        FeatureDef::simple(
            "def_to_mid_prevention_rate",
            CAT,
            TEAM_LEVELS,
            def_to_mid_prevention_rate,
        ),
        FeatureDef::simple(
            "mid_to_final_passes_allowed",
            CAT,
            TEAM_LEVELS,
            mid_to_final_passes_allowed,
        ),
        FeatureDef::simple(
            "mid_to_final_carries_allowed",
            CAT,
            TEAM_LEVELS,
            mid_to_final_carries_allowed,
        ),
        FeatureDef::simple(
            "mid_to_final_prevention_rate",
            CAT,
            TEAM_LEVELS,
            mid_to_final_prevention_rate,
        ),
        FeatureDef::simple("bypass_attempts_total", CAT, TEAM_LEVELS, bypass_attempts_total),
        FeatureDef::simple("bypass_prevention_rate", CAT, TEAM_LEVELS, bypass_prevention_rate),
        FeatureDef::simple(
            "dangerous_actions_per_opp_possession",
            CAT,
            TEAM_LEVELS,
            dangerous_actions_per_opp_possession,
        ),
    ]);
}

fn crossings<'a>(
    scope: &Scope<'a>,
    fcx: &FeatureContext<'a>,
    kind: EventKind,
    cut: Cut,
) -> Subset<'a> {
    let mut s = fcx.opp_kind_located(scope, kind);
    s.events.retain(|e: &&Event| match (e.location, e.end_location()) {
        (Some(start), Some(end)) => cut.crossed(fcx, start, end),
        _ => false,
    });
    s
}

fn prevention<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>, cut: Cut) -> Measured {
    let passes = crossings(scope, fcx, EventKind::Pass, cut);
    let carries = crossings(scope, fcx, EventKind::Carry, cut);
    let interceptions = EventFilter::new()
        .actor(Side::Us)
        .kind(EventKind::Interception)
        .in_thirds(&Third::ALL)
        .apply(fcx.ctx, scope.events.iter().copied());

    let cut_x = cut.x(fcx);
    let stopped = interceptions.count_where(|e| {
        e.location
            .is_some_and(|loc| fcx.ctx.classifier.near_cut(loc.x, cut_x))
    });
    let allowed = passes.len() + carries.len();

    let mut excluded = passes.excluded;
    excluded += carries.excluded;
    excluded += interceptions.excluded;
    let value = match FeatureValue::ratio(stopped as f64, allowed as f64) {
        FeatureValue::Value(v) => FeatureValue::Value(v.min(1.0)),
        undefined => undefined,
    };
    Measured::new(value, excluded)
}

fn def_to_mid_passes_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&crossings(scope, fcx, EventKind::Pass, Cut::DefensiveToMidfield))
}

fn def_to_mid_carries_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&crossings(scope, fcx, EventKind::Carry, Cut::DefensiveToMidfield))
}

fn def_to_mid_prevention_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    prevention(scope, fcx, Cut::DefensiveToMidfield)
}

fn mid_to_final_passes_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&crossings(scope, fcx, EventKind::Pass, Cut::MidfieldToFinal))
}

fn mid_to_final_carries_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&crossings(scope, fcx, EventKind::Carry, Cut::MidfieldToFinal))
}

fn mid_to_final_prevention_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    prevention(scope, fcx, Cut::MidfieldToFinal)
}

fn bypass_summary<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> BypassSummary {
    BypassSummary::collect(
        scope.possessions.iter().copied(),
        &fcx.ctx.classifier,
        fcx.ctx.target_team(),
    )
}

fn bypass_attempts_total<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::count(bypass_summary(scope, fcx).attempts, Exclusions::default())
}

fn bypass_prevention_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::plain(bypass_summary(scope, fcx).prevention_rate())
}

/// Progressive passes, through balls and band-crossing carries per opponent possession.
fn dangerous_actions_per_opp_possession<'a>(
    scope: &Scope<'a>,
    fcx: &FeatureContext<'a>,
) -> Measured {
    let progressive = access::progressive(scope, fcx);
    let through = access::through_balls(scope, fcx);
    let carries = carries_through_region(scope, fcx);

    let total = progressive.len() as f64
        + through.len() as f64
        + carries.value.as_option().unwrap_or(0.0);
    let mut excluded = progressive.excluded;
    excluded += through.excluded;
    excluded += carries.excluded;
    let opp = scope.opponent_possessions(fcx.ctx).len();
    Measured::ratio(total, opp as f64, excluded)
}

#[cfg(test)]
mod tests {
    use crate::analysis::features::fixtures::*;
    use crate::models::{Event, EventDetails, EventKind, FeatureValue, PassDetails};

    fn through(index: u64, t: f64, start: (f64, f64), end: (f64, f64), possession: u32) -> Event {
        ev(index, t, EventKind::Pass, THEM, THEM, possession)
            .with_location(start.0, start.1)
            .with_details(EventDetails::Pass(PassDetails {
                end_location: Some(crate::models::Location::new(end.0, end.1)),
                length: Some(end.0 - start.0),
                through_ball: Some(true),
                ..Default::default()
            }))
    }

    fn stream() -> Vec<Event> {
        vec![
            // Opponent possession 1: deep start, crosses both cuts, bypass attempt
            ev(1, 0.0, EventKind::Pass, THEM, THEM, 1)
                .with_location(30.0, 40.0)
                .with_details(pass_details(15.0, (45.0, 40.0), None)),
            ev(2, 3.0, EventKind::Carry, THEM, THEM, 1)
                .with_location(45.0, 40.0)
                .with_details(carry_details((60.0, 40.0))),
            through(3, 6.0, (60.0, 40.0), (90.0, 40.0), 1),
            // Our interception inside the final entry band
            ev(4, 8.0, EventKind::Interception, US, THEM, 1).with_location(81.0, 40.0),
            // Opponent possession 2: stays in midfield
            ev(5, 20.0, EventKind::Carry, THEM, THEM, 2)
                .with_location(50.0, 40.0)
                .with_details(carry_details((55.0, 40.0))),
            // Our possession
            ev(6, 30.0, EventKind::Pass, US, US, 3).with_location(60.0, 40.0),
            // Opponent possession 3: carry from deep through the band
            ev(7, 40.0, EventKind::Carry, THEM, THEM, 4)
                .with_location(35.0, 40.0)
                .with_details(carry_details((85.0, 40.0))),
        ]
    }

    #[test]
    fn test_cut_crossings() {
        let fx = Fixture::new(stream());
        assert_value(fx.value("def_to_mid_passes_allowed"), 1.0);
        assert_value(fx.value("def_to_mid_carries_allowed"), 1.0);
        assert_value(fx.value("mid_to_final_passes_allowed"), 1.0);
        assert_value(fx.value("mid_to_final_carries_allowed"), 0.0);
    }

    #[test]
    fn test_prevention_rates() {
        let fx = Fixture::new(stream());
        // No interception near x = 40; one at 81 against a single crossing
        assert_value(fx.value("def_to_mid_prevention_rate"), 0.0);
        assert_value(fx.value("mid_to_final_prevention_rate"), 1.0);
    }

    #[test]
    fn test_bypass_summary() {
        let fx = Fixture::new(stream());
        // Possession 1 reaches x = 81; possession 4 only records its carry start
        assert_value(fx.value("bypass_attempts_total"), 1.0);
        assert_value(fx.value("bypass_prevention_rate"), 1.0 - 1.0 / 3.0);
    }

    #[test]
    fn test_dangerous_actions() {
        let fx = Fixture::new(stream());
        // Band: through ball at 60 is also progressive (+2); carry 35 → 85 (+1)
        assert_value(fx.value("dangerous_actions_per_opp_possession"), 3.0 / 3.0);
    }

    #[test]
    fn test_no_opponent_possessions() {
        let fx = Fixture::new(vec![
            ev(1, 0.0, EventKind::Pass, US, US, 1).with_location(30.0, 40.0),
        ]);
        assert_eq!(fx.value("bypass_prevention_rate"), FeatureValue::Undefined);
        assert_eq!(
            fx.value("dangerous_actions_per_opp_possession"),
            FeatureValue::Undefined
        );
        assert_eq!(fx.value("def_to_mid_prevention_rate"), FeatureValue::Undefined);
        assert_value(fx.value("bypass_attempts_total"), 0.0);
    }
}
