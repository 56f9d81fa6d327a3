//! Access control: progressive passes, through balls and switches the
//! opponent plays from inside the target band.

use super::{mean, Category, FeatureContext, FeatureDef, Measured, Scope, TEAM_LEVELS};
use crate::analysis::predicates::{
    is_progressive_pass_cfg, is_switch, is_through_ball, travel_length, Located, Subset,
};
use crate::analysis::zones::Third;
use crate::config::ExtractionConfig;
use crate::models::{Event, EventKind, PassOutcome};

const CAT: Category = Category::Access;

pub(super) fn register(defs: &mut Vec<FeatureDef>, _config: &ExtractionConfig) {
    defs.extend([
        FeatureDef::simple(
            "progressive_passes_allowed",
            CAT,
            TEAM_LEVELS,
            progressive_passes_allowed,
        ),
        FeatureDef::simple(
            "progressive_pass_prevention_rate",
            CAT,
            TEAM_LEVELS,
            progressive_pass_prevention_rate,
        ),
        FeatureDef::simple(
            "progressive_passes_central",
            CAT,
            TEAM_LEVELS,
            progressive_passes_central,
        ),
        FeatureDef::simple(
            "progressive_passes_wide",
            CAT,
            TEAM_LEVELS,
            progressive_passes_wide,
        ),
        FeatureDef::simple(
            "progressive_pass_length_mean",
            CAT,
            TEAM_LEVELS,
            progressive_pass_length_mean,
        ),
        FeatureDef::simple(
            "progressive_pass_angle_mean",
            CAT,
            TEAM_LEVELS,
            progressive_pass_angle_mean,
        ),
        FeatureDef::simple("through_balls_allowed", CAT, TEAM_LEVELS, through_balls_allowed),
        FeatureDef::simple(
            "through_ball_prevention_rate",
            CAT,
            TEAM_LEVELS,
            through_ball_prevention_rate,
        ),
        FeatureDef::simple(
            "through_balls_into_final_third",
            CAT,
            TEAM_LEVELS,
            through_balls_into_final_third,
        ),
        FeatureDef::simple("switches_allowed", CAT, TEAM_LEVELS, switches_allowed),
        FeatureDef::simple("switch_prevention_rate", CAT, TEAM_LEVELS, switch_prevention_rate),
        FeatureDef::simple("switch_length_mean", CAT, TEAM_LEVELS, switch_length_mean),
    ]);
}

/// A pass attempt the opponent failed to complete.
fn is_prevented(e: &Event) -> bool {
    e.pass().and_then(|p| p.outcome) == Some(PassOutcome::Incomplete)
}

fn band_passes_where<'a>(
    scope: &Scope<'a>,
    fcx: &FeatureContext<'a>,
    pred: impl Fn(&Event) -> bool,
) -> Subset<'a> {
    let mut s = fcx.opp_kind_in_band(scope, EventKind::Pass);
    s.events.retain(|e| pred(e));
    s
}

/// Opponent progressive passes starting in the band.
pub(super) fn progressive<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Subset<'a> {
    band_passes_where(scope, fcx, |e| is_progressive_pass_cfg(fcx.ctx, e))
}

/// Opponent through balls starting in the band.
pub(super) fn through_balls<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Subset<'a> {
    band_passes_where(scope, fcx, is_through_ball)
}

fn switches<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Subset<'a> {
    band_passes_where(scope, fcx, is_switch)
}

fn prevention_rate(s: &Subset) -> Measured {
    Measured::ratio(
        s.count_where(is_prevented) as f64,
        s.len() as f64,
        s.excluded,
    )
}

fn progressive_passes_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&progressive(scope, fcx))
}

fn progressive_pass_prevention_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    prevention_rate(&progressive(scope, fcx))
}

fn progressive_by_lane<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>, wide: bool) -> Measured {
    let s = progressive(scope, fcx);
    let n = s
        .events
        .iter()
        .filter(|e| fcx.lane_of(e).is_some_and(|l| l.is_wide() == wide))
        .count();
    Measured::count(n, s.excluded)
}

fn progressive_passes_central<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    progressive_by_lane(scope, fcx, false)
}

fn progressive_passes_wide<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    progressive_by_lane(scope, fcx, true)
}

fn progressive_pass_length_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = progressive(scope, fcx);
    let lengths: Vec<f64> = s.events.iter().filter_map(|e| travel_length(e)).collect();
    Measured::option(mean(&lengths), s.excluded)
}

fn progressive_pass_angle_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = progressive(scope, fcx);
    let angles: Vec<f64> = s
        .events
        .iter()
        .filter_map(|e| e.pass().and_then(|p| p.angle))
        .collect();
    Measured::option(mean(&angles), s.excluded)
}

fn through_balls_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&through_balls(scope, fcx))
}

fn through_ball_prevention_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    prevention_rate(&through_balls(scope, fcx))
}

/// Through balls whose end location lies in the final third.
fn through_balls_into_final_third<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = through_balls(scope, fcx);
    let mut excluded = s.excluded;
    let mut n = 0;
    for e in &s.events {
        match fcx.ctx.locate_end(e) {
            Located::At(_, zone) if zone.third == Third::Final => n += 1,
            Located::At(..) => {}
            Located::Missing => excluded.missing_location += 1,
            Located::OutOfRange => excluded.out_of_range += 1,
        }
    }
    Measured::count(n, excluded)
}

fn switches_allowed<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    Measured::of_subset(&switches(scope, fcx))
}

fn switch_prevention_rate<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    prevention_rate(&switches(scope, fcx))
}

fn switch_length_mean<'a>(scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
    let s = switches(scope, fcx);
    let lengths: Vec<f64> = s.events.iter().filter_map(|e| travel_length(e)).collect();
    Measured::option(mean(&lengths), s.excluded)
}

#[cfg(test)]
mod tests {
    use crate::analysis::features::fixtures::*;
    use crate::models::{
        Event, EventDetails, EventKind, FeatureValue, Location, PassDetails, PassOutcome,
    };

    fn special(
        index: u64,
        through: bool,
        switch: bool,
        end: (f64, f64),
        outcome: Option<PassOutcome>,
    ) -> Event {
        ev(index, index as f64, EventKind::Pass, THEM, THEM, 1)
            .with_location(50.0, 40.0)
            .with_details(EventDetails::Pass(PassDetails {
                end_location: Some(Location::new(end.0, end.1)),
                length: Some(35.0),
                outcome,
                through_ball: Some(through),
                switch: Some(switch),
                angle: Some(0.2),
            }))
    }

    fn stream() -> Vec<Event> {
        vec![
            // Progressive: length 15, gain 8
            ev(1, 0.0, EventKind::Pass, THEM, THEM, 1)
                .with_location(50.0, 40.0)
                .with_details(pass_details(15.0, (58.0, 40.0), None)),
            // Not progressive: gain 3
            ev(2, 1.0, EventKind::Pass, THEM, THEM, 1)
                .with_location(50.0, 20.0)
                .with_details(pass_details(15.0, (53.0, 5.0), None)),
            // Progressive, wide, prevented
            ev(3, 2.0, EventKind::Pass, THEM, THEM, 1)
                .with_location(60.0, 10.0)
                .with_details(pass_details(25.0, (80.0, 20.0), Some(PassOutcome::Incomplete))),
            special(4, true, false, (85.0, 40.0), None),
            special(5, true, false, (75.0, 40.0), Some(PassOutcome::Incomplete)),
            special(6, false, true, (55.0, 75.0), None),
            // Outside the band
            ev(7, 7.0, EventKind::Pass, THEM, THEM, 1)
                .with_location(20.0, 40.0)
                .with_details(pass_details(30.0, (50.0, 40.0), None)),
        ]
    }

    #[test]
    fn test_progressive_passes() {
        let fx = Fixture::new(stream());
        // 1, 3, 4 (gain 35), 5 (gain 25); 6 gains only 5
        assert_value(fx.value("progressive_passes_allowed"), 4.0);
        assert_value(fx.value("progressive_pass_prevention_rate"), 0.5);
        assert_value(fx.value("progressive_passes_wide"), 1.0);
        assert_value(fx.value("progressive_passes_central"), 3.0);
        assert_value(
            fx.value("progressive_pass_length_mean"),
            (15.0 + 25.0 + 35.0 + 35.0) / 4.0,
        );
        assert_value(fx.value("progressive_pass_angle_mean"), 0.2);
    }

    #[test]
    fn test_through_balls_and_switches() {
        let fx = Fixture::new(stream());
        assert_value(fx.value("through_balls_allowed"), 2.0);
        assert_value(fx.value("through_ball_prevention_rate"), 0.5);
        assert_value(fx.value("through_balls_into_final_third"), 1.0);
        assert_value(fx.value("switches_allowed"), 1.0);
        assert_value(fx.value("switch_prevention_rate"), 0.0);
        assert_value(fx.value("switch_length_mean"), 35.0);
    }

    #[test]
    fn test_no_switches_rate_undefined() {
        let fx = Fixture::new(vec![ev(1, 0.0, EventKind::Pass, THEM, THEM, 1)
            .with_location(50.0, 40.0)
            .with_details(pass_details(15.0, (58.0, 40.0), None))]);
        assert_eq!(fx.value("switch_prevention_rate"), FeatureValue::Undefined);
        assert_eq!(fx.value("switch_length_mean"), FeatureValue::Undefined);
        assert_value(fx.value("switches_allowed"), 0.0);
    }
}
