//! # Feature Computer
//!
//! Registry of named feature definitions grouped by category. Every feature
//! is a plain function of a [`Scope`] (the events and possessions of one
//! aggregation key) and a [`FeatureContext`] (the whole stream plus config).
//!
//! ## Rules shared by every feature
//! - Counts run over an explicitly filtered subset ([`EventFilter`])
//! - Rates with a zero denominator are undefined
//! - Spatial means and dispersions use located events only and are
//!   undefined when none are left
//! - "Progressive" always reads the configured thresholds
//!
//! ## Categories
//!
//! | Category | Module |
//! |----------|--------|
//! | Defensive actions | [`defensive`] |
//! | Pressure and tempo | [`pressure`] |
//! | Access control | [`access`] |
//! | Spatial and compactness | [`spatial`] |
//! | Passing | [`passing`] |
//! | Carrying | [`carrying`] |
//! | Recovery and transition | [`transitions`] |
//! | Temporal and context | [`temporal`] |
//! | Zone transitions | [`zone_transition`] |
//! | Player and role | [`player`] |

pub mod access;
pub mod carrying;
pub mod defensive;
pub mod passing;
pub mod player;
pub mod pressure;
pub mod spatial;
pub mod temporal;
pub mod transitions;
pub mod zone_transition;

use std::borrow::Cow;

use crate::analysis::predicates::{EventFilter, MatchContext, Side, Subset};
use crate::analysis::windows::Timeline;
use crate::analysis::zones::Lane;
use crate::config::ExtractionConfig;
use crate::models::{
    AggregationLevel, Event, EventKind, Exclusions, FeatureValue, Location, PlayerId, Possession,
    RecordKey,
};

/// Levels that describe the team as a whole.
pub const TEAM_LEVELS: &[AggregationLevel] = &[
    AggregationLevel::Match,
    AggregationLevel::Period,
    AggregationLevel::TimeWindow,
    AggregationLevel::Zone,
];

pub const POSSESSION_LEVEL: &[AggregationLevel] = &[AggregationLevel::Possession];

pub const PLAYER_LEVEL: &[AggregationLevel] = &[AggregationLevel::Player];

pub const DEFENSIVE_ACTIONS: &[EventKind] = &[
    EventKind::Interception,
    EventKind::BallRecovery,
    EventKind::Duel,
    EventKind::Block,
    EventKind::Clearance,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Defensive,
    Pressure,
    Access,
    Spatial,
    Passing,
    Carrying,
    Transitions,
    Temporal,
    ZoneTransition,
    Player,
}

/// Events and possessions behind one output record.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    pub key: RecordKey,
    pub events: Vec<&'a Event>,
    pub possessions: Vec<&'a Possession>,
    /// Playing time covered, for per-minute rates.
    pub duration_minutes: Option<f64>,
    pub player: Option<PlayerId>,
}

impl<'a> Scope<'a> {
    pub fn new(key: RecordKey, events: Vec<&'a Event>, possessions: Vec<&'a Possession>) -> Self {
        Self {
            key,
            events,
            possessions,
            duration_minutes: None,
            player: None,
        }
    }

    pub fn with_duration(mut self, minutes: Option<f64>) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    pub fn opponent_possessions(&self, ctx: &MatchContext) -> Vec<&'a Possession> {
        self.possessions
            .iter()
            .copied()
            .filter(|p| p.team_id != ctx.target_team())
            .collect()
    }

    pub fn our_possessions(&self, ctx: &MatchContext) -> Vec<&'a Possession> {
        self.possessions
            .iter()
            .copied()
            .filter(|p| p.team_id == ctx.target_team())
            .collect()
    }
}

/// Whole-stream view shared by every scope of one run.
#[derive(Debug, Clone, Copy)]
pub struct FeatureContext<'a> {
    pub ctx: &'a MatchContext,
    pub stream: &'a [Event],
    /// Ordered by first index.
    pub possessions: &'a [Possession],
}

impl<'a> FeatureContext<'a> {
    pub fn new(ctx: &'a MatchContext, stream: &'a [Event], possessions: &'a [Possession]) -> Self {
        Self {
            ctx,
            stream,
            possessions,
        }
    }

    pub fn config(&self) -> &'a ExtractionConfig {
        &self.ctx.config
    }

    pub fn stream_timeline(&self) -> Timeline<'a> {
        Timeline::new(self.stream, &self.ctx.clock)
    }

    /// Possession unit holding `event`.
    pub fn possession_of(&self, event: &Event) -> Option<&'a Possession> {
        let after = self
            .possessions
            .partition_point(|p| p.key.first_index <= event.index);
        let candidate = self.possessions.get(after.checked_sub(1)?)?;
        candidate
            .events
            .binary_search_by_key(&event.index, |e| e.index)
            .ok()
            .map(|_| candidate)
    }

    /// Timeline of the event's possession and the event's position in it.
    pub fn possession_timeline(&self, event: &Event) -> Option<(Timeline<'a>, usize)> {
        let possession = self.possession_of(event)?;
        let timeline = Timeline::new(&possession.events, &self.ctx.clock);
        let pos = timeline.position_of(event.index)?;
        Some((timeline, pos))
    }

    pub fn elapsed_in_possession(&self, event: &Event) -> Option<f64> {
        let (timeline, pos) = self.possession_timeline(event)?;
        timeline.elapsed_since_start(pos)
    }

    pub fn lane_of(&self, event: &Event) -> Option<Lane> {
        self.ctx.locate(event).zone().map(|z| z.lane)
    }

    // Frequently used subsets

    /// Opponent actions in opponent possession, located in the target band.
    pub fn opp_in_band(&self, scope: &Scope<'a>) -> Subset<'a> {
        EventFilter::opponent_events()
            .in_target_band(self.ctx)
            .apply(self.ctx, scope.events.iter().copied())
    }

    pub fn opp_kind_in_band(&self, scope: &Scope<'a>, kind: EventKind) -> Subset<'a> {
        EventFilter::opponent_events()
            .kind(kind)
            .in_target_band(self.ctx)
            .apply(self.ctx, scope.events.iter().copied())
    }

    /// Opponent actions of `kind` anywhere on the pitch (located).
    pub fn opp_kind_located(&self, scope: &Scope<'a>, kind: EventKind) -> Subset<'a> {
        use crate::analysis::zones::Third;
        EventFilter::opponent_events()
            .kind(kind)
            .in_thirds(&Third::ALL)
            .apply(self.ctx, scope.events.iter().copied())
    }

    pub fn ours_in_band(&self, scope: &Scope<'a>, kinds: &[EventKind]) -> Subset<'a> {
        EventFilter::new()
            .actor(Side::Us)
            .kinds(kinds)
            .in_target_band(self.ctx)
            .apply(self.ctx, scope.events.iter().copied())
    }
}

/// A computed value and what the computation had to leave out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measured {
    pub value: FeatureValue,
    pub excluded: Exclusions,
}

impl Measured {
    pub fn new(value: FeatureValue, excluded: Exclusions) -> Self {
        Self { value, excluded }
    }

    pub fn plain(value: FeatureValue) -> Self {
        Self::new(value, Exclusions::default())
    }

    pub fn count(n: usize, excluded: Exclusions) -> Self {
        Self::new(FeatureValue::count(n), excluded)
    }

    pub fn of_subset(subset: &Subset) -> Self {
        Self::count(subset.len(), subset.excluded)
    }

    pub fn ratio(numerator: f64, denominator: f64, excluded: Exclusions) -> Self {
        Self::new(FeatureValue::ratio(numerator, denominator), excluded)
    }

    pub fn option(value: Option<f64>, excluded: Exclusions) -> Self {
        Self::new(FeatureValue::from_option(value), excluded)
    }
}

pub type SimpleFn = for<'a> fn(&Scope<'a>, &FeatureContext<'a>) -> Measured;
pub type WindowedFn = for<'a> fn(&Scope<'a>, &FeatureContext<'a>, f64) -> Measured;

#[derive(Clone, Copy)]
pub enum Computation {
    Simple(SimpleFn),
    /// Parameterised by a window length in seconds.
    Windowed(WindowedFn, f64),
}

#[derive(Clone)]
pub struct FeatureDef {
    pub name: Cow<'static, str>,
    pub category: Category,
    pub levels: &'static [AggregationLevel],
    pub computation: Computation,
}

impl std::fmt::Debug for FeatureDef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FeatureDef")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

impl FeatureDef {
    pub fn simple(
        name: &'static str,
        category: Category,
        levels: &'static [AggregationLevel],
        compute: SimpleFn,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            category,
            levels,
            computation: Computation::Simple(compute),
        }
    }

    pub fn windowed(
        name: String,
        category: Category,
        levels: &'static [AggregationLevel],
        compute: WindowedFn,
        window_s: f64,
    ) -> Self {
        Self {
            name: Cow::Owned(name),
            category,
            levels,
            computation: Computation::Windowed(compute, window_s),
        }
    }

    pub fn applies_to(&self, level: AggregationLevel) -> bool {
        self.levels.contains(&level)
    }

    pub fn compute<'a>(&self, scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> Measured {
        match self.computation {
            Computation::Simple(f) => f(scope, fcx),
            Computation::Windowed(f, window_s) => f(scope, fcx, window_s),
        }
    }
}

/// All features enabled by one configuration.
#[derive(Debug, Clone)]
pub struct Registry {
    defs: Vec<FeatureDef>,
}

impl Registry {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let mut defs = Vec::new();
        defensive::register(&mut defs, config);
        pressure::register(&mut defs, config);
        access::register(&mut defs, config);
        spatial::register(&mut defs, config);
        passing::register(&mut defs, config);
        carrying::register(&mut defs, config);
        transitions::register(&mut defs, config);
        temporal::register(&mut defs, config);
        zone_transition::register(&mut defs, config);
        player::register(&mut defs, config);
        Self { defs }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureDef> {
        self.defs.iter()
    }

    pub fn for_level(&self, level: AggregationLevel) -> impl Iterator<Item = &FeatureDef> {
        self.defs.iter().filter(move |d| d.applies_to(level))
    }

    pub fn get(&self, name: &str) -> Option<&FeatureDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

// Small numeric helpers

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation.
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

pub fn xs(points: &[Location]) -> Vec<f64> {
    points.iter().map(|p| p.x).collect()
}

pub fn ys(points: &[Location]) -> Vec<f64> {
    points.iter().map(|p| p.y).collect()
}

/// Sum of per-period spans, in minutes.
pub fn span_minutes<'a>(events: impl IntoIterator<Item = &'a Event>) -> Option<f64> {
    let mut spans: std::collections::BTreeMap<u8, (f64, f64)> = std::collections::BTreeMap::new();
    for e in events {
        let entry = spans
            .entry(e.period)
            .or_insert((e.timestamp_s, e.timestamp_s));
        entry.0 = entry.0.min(e.timestamp_s);
        entry.1 = entry.1.max(e.timestamp_s);
    }
    if spans.is_empty() {
        return None;
    }
    Some(spans.values().map(|(lo, hi)| hi - lo).sum::<f64>() / 60.0)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_population_std() {
        assert_eq!(population_std(&[]), None);
        assert_eq!(population_std(&[3.0]), Some(0.0));
        let std = population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_registry_names_unique() {
        let registry = Registry::from_config(&ExtractionConfig::new(US));
        let mut names: Vec<_> = registry.iter().map(|d| d.name.to_string()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(registry.get("pressure_within_5s").is_some());
        assert!(registry.get("pressure_within_10s").is_some());
    }

    #[test]
    fn test_window_features_follow_config() {
        let mut config = ExtractionConfig::new(US);
        config.windows.pressure_windows_s = vec![3.0];
        let registry = Registry::from_config(&config);
        assert!(registry.get("pressure_within_3s").is_some());
        assert!(registry.get("pressure_within_5s").is_none());
    }

    #[test]
    fn test_possession_lookup() {
        let fx = Fixture::new(vec![
            ev(1, 0.0, EventKind::Pass, THEM, THEM, 1),
            ev(2, 1.0, EventKind::Pass, THEM, THEM, 1),
            ev(5, 4.0, EventKind::Pass, US, US, 2),
        ]);
        let fcx = fx.fcx();
        assert_eq!(fcx.possession_of(&fx.events[1]).map(|p| p.id()), Some(1));
        assert_eq!(fcx.possession_of(&fx.events[2]).map(|p| p.id()), Some(2));
        assert_eq!(fcx.elapsed_in_possession(&fx.events[1]), Some(1.0));
    }

    #[test]
    fn test_span_minutes_sums_periods() {
        let mut second = ev(3, 30.0, EventKind::Pass, US, US, 2);
        second.period = 2;
        let events = vec![
            ev(1, 0.0, EventKind::Pass, US, US, 1),
            ev(2, 120.0, EventKind::Pass, US, US, 1),
            second,
            ev(4, 90.0, EventKind::Pass, US, US, 2),
        ];
        // ev(4) is period 1 in the builder; spans: p1 0..120, p2 30..30
        assert_eq!(span_minutes(&events), Some(2.0));
    }
}
