//! # Event Predicates
//!
//! Typed boolean functions over one event plus match context, and an
//! [`EventFilter`] that conjoins them.
//!
//! Kind-specific predicates return `false` when the optional attribute they
//! need is absent. Spatial filtering is different: an event without a usable
//! location is neither kept nor silently dropped; it is counted in
//! [`Exclusions`] so coverage can be audited per feature.

use crate::analysis::windows::MatchClock;
use crate::analysis::zones::{Lane, Third, ZoneClassifier, ZoneLabel};
use crate::config::ExtractionConfig;
use crate::models::{Event, EventKind, Exclusions, Location, TeamId};

/// Match-level context shared by every predicate.
#[derive(Debug, Clone)]
pub struct MatchContext {
    pub config: ExtractionConfig,
    pub classifier: ZoneClassifier,
    pub clock: MatchClock,
}

impl MatchContext {
    pub fn new(config: ExtractionConfig) -> Self {
        let classifier = ZoneClassifier::new(config.zones.clone());
        let clock = MatchClock::new(config.clock.clone());
        Self {
            config,
            classifier,
            clock,
        }
    }

    pub fn target_team(&self) -> TeamId {
        self.config.target_team
    }

    /// Zone of an event's start location.
    pub fn locate(&self, event: &Event) -> Located {
        locate_point(&self.classifier, event.location)
    }

    /// Zone of a pass/carry end location.
    pub fn locate_end(&self, event: &Event) -> Located {
        locate_point(&self.classifier, event.end_location())
    }

    /// Valid on-pitch locations of `events`, with the rest accounted for.
    pub fn locations<'a>(
        &self,
        events: impl IntoIterator<Item = &'a Event>,
    ) -> (Vec<Location>, Exclusions) {
        let mut points = Vec::new();
        let mut excluded = Exclusions::default();
        for event in events {
            match self.locate(event) {
                Located::At(loc, _) => points.push(loc),
                Located::Missing => excluded.missing_location += 1,
                Located::OutOfRange => excluded.out_of_range += 1,
            }
        }
        (points, excluded)
    }
}

/// Outcome of placing a location on the pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Located {
    At(Location, ZoneLabel),
    Missing,
    OutOfRange,
}

impl Located {
    pub fn zone(&self) -> Option<ZoneLabel> {
        match self {
            Located::At(_, zone) => Some(*zone),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Located::At(loc, _) => Some(*loc),
            _ => None,
        }
    }

    fn record_exclusion(&self, excluded: &mut Exclusions) {
        match self {
            Located::Missing => excluded.missing_location += 1,
            Located::OutOfRange => excluded.out_of_range += 1,
            Located::At(..) => {}
        }
    }
}

fn locate_point(classifier: &ZoneClassifier, location: Option<Location>) -> Located {
    match location {
        None => Located::Missing,
        Some(loc) => match classifier.classify_location(&loc) {
            Ok(zone) => Located::At(loc, zone),
            Err(_) => Located::OutOfRange,
        },
    }
}

// Ownership and actor

pub fn is_opponent_possession(ctx: &MatchContext, event: &Event) -> bool {
    event.possession_team_id != ctx.target_team()
}

pub fn is_team_action(ctx: &MatchContext, event: &Event) -> bool {
    event.team_id == ctx.target_team()
}

pub fn is_opponent_action(ctx: &MatchContext, event: &Event) -> bool {
    event.team_id != ctx.target_team()
}

/// Opponent on the ball in its own possession.
pub fn is_opponent_event(ctx: &MatchContext, event: &Event) -> bool {
    is_opponent_possession(ctx, event) && is_opponent_action(ctx, event)
}

pub fn is_kind(event: &Event, kind: EventKind) -> bool {
    event.kind == kind
}

pub fn is_under_pressure(event: &Event) -> bool {
    event.under_pressure == Some(true)
}

pub fn is_defensive_action(event: &Event) -> bool {
    event.kind.is_defensive_action()
}

/// Defensive action that regained or denied the ball.
pub fn is_successful_defensive_action(event: &Event) -> bool {
    match event.kind {
        EventKind::Interception => is_successful_interception(event),
        EventKind::BallRecovery => is_successful_recovery(event),
        EventKind::Duel => is_won_duel(event),
        EventKind::Block | EventKind::Clearance => true,
        _ => false,
    }
}

pub fn is_successful_interception(event: &Event) -> bool {
    event
        .interception()
        .and_then(|i| i.outcome)
        .is_some_and(|o| o.is_success())
}

/// A recovery without an explicit failure flag counts as successful.
pub fn is_successful_recovery(event: &Event) -> bool {
    event
        .recovery()
        .map_or(event.kind == EventKind::BallRecovery, |r| {
            r.recovery_failure != Some(true)
        })
}

pub fn is_won_duel(event: &Event) -> bool {
    event
        .duel()
        .and_then(|d| d.outcome)
        .is_some_and(|o| o.is_won())
}

// Pass and carry attributes

pub fn is_completed_pass(event: &Event) -> bool {
    event.pass().is_some_and(|p| p.is_completed())
}

pub fn is_through_ball(event: &Event) -> bool {
    event.pass().and_then(|p| p.through_ball) == Some(true)
}

pub fn is_switch(event: &Event) -> bool {
    event.pass().and_then(|p| p.switch) == Some(true)
}

/// end_x - start_x of a pass or carry.
pub fn forward_gain(event: &Event) -> Option<f64> {
    let start = event.location?;
    let end = event.end_location()?;
    Some(end.x - start.x)
}

/// Recorded pass length, else the start-to-end distance.
pub fn travel_length(event: &Event) -> Option<f64> {
    if let Some(length) = event.pass().and_then(|p| p.length) {
        return Some(length);
    }
    let start = event.location?;
    let end = event.end_location()?;
    Some(start.distance_to(&end))
}

fn is_progressive(event: &Event, min_length: f64, min_gain: f64) -> bool {
    match (travel_length(event), forward_gain(event)) {
        (Some(length), Some(gain)) => length > min_length && gain > min_gain,
        _ => false,
    }
}

pub fn is_progressive_pass(event: &Event, min_length: f64, min_forward_gain: f64) -> bool {
    event.pass().is_some() && is_progressive(event, min_length, min_forward_gain)
}

pub fn is_progressive_carry(event: &Event, min_length: f64, min_forward_gain: f64) -> bool {
    event.carry().is_some() && is_progressive(event, min_length, min_forward_gain)
}

/// Progressive pass under the configured thresholds.
pub fn is_progressive_pass_cfg(ctx: &MatchContext, event: &Event) -> bool {
    let p = &ctx.config.progressive;
    is_progressive_pass(event, p.min_length, p.min_forward_gain)
}

pub fn is_progressive_carry_cfg(ctx: &MatchContext, event: &Event) -> bool {
    let p = &ctx.config.progressive;
    is_progressive_carry(event, p.min_length, p.min_forward_gain)
}

/// Whether the event's zone is one of `zones`; `None` when unplaceable.
pub fn in_zone(ctx: &MatchContext, event: &Event, zones: &[ZoneLabel]) -> Option<bool> {
    ctx.locate(event).zone().map(|z| zones.contains(&z))
}

/// Side selector relative to the target team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Us,
    Opponent,
}

impl Side {
    fn matches(self, ctx: &MatchContext, team: TeamId) -> bool {
        match self {
            Side::Us => team == ctx.target_team(),
            Side::Opponent => team != ctx.target_team(),
        }
    }
}

/// Which location a spatial filter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
}

#[derive(Debug, Clone, Default)]
struct Region {
    thirds: Option<Vec<Third>>,
    lanes: Option<Vec<Lane>>,
}

impl Region {
    fn contains(&self, zone: ZoneLabel) -> bool {
        self.thirds.as_ref().map_or(true, |t| t.contains(&zone.third))
            && self.lanes.as_ref().map_or(true, |l| l.contains(&zone.lane))
    }
}

pub type Condition = fn(&MatchContext, &Event) -> bool;

/// Conjunction of predicates.
///
/// Non-spatial conditions run first, so only events that would otherwise
/// qualify are counted as excluded by a spatial condition.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    actor: Option<Side>,
    possession: Option<Side>,
    kinds: Option<Vec<EventKind>>,
    regions: Vec<(Anchor, Region)>,
    conditions: Vec<Condition>,
}

/// Events that passed a filter, plus the ones a spatial condition could not judge.
#[derive(Debug, Clone, Default)]
pub struct Subset<'a> {
    pub events: Vec<&'a Event>,
    pub excluded: Exclusions,
}

impl<'a> Subset<'a> {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count_where<P>(&self, pred: P) -> usize
    where
        P: Fn(&Event) -> bool,
    {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opponent actions in opponent possession.
    pub fn opponent_events() -> Self {
        Self::new().actor(Side::Opponent).possession(Side::Opponent)
    }

    /// Our actions while the opponent has the ball.
    pub fn our_defending() -> Self {
        Self::new().actor(Side::Us).possession(Side::Opponent)
    }

    pub fn actor(mut self, side: Side) -> Self {
        self.actor = Some(side);
        self
    }

    pub fn possession(mut self, side: Side) -> Self {
        self.possession = Some(side);
        self
    }

    pub fn kind(self, kind: EventKind) -> Self {
        self.kinds(&[kind])
    }

    pub fn kinds(mut self, kinds: &[EventKind]) -> Self {
        self.kinds = Some(kinds.to_vec());
        self
    }

    pub fn in_thirds(self, thirds: &[Third]) -> Self {
        self.region_at(Anchor::Start, Some(thirds), None)
    }

    pub fn in_lanes(self, lanes: &[Lane]) -> Self {
        self.region_at(Anchor::Start, None, Some(lanes))
    }

    /// Start location inside the configured target band.
    pub fn in_target_band(self, ctx: &MatchContext) -> Self {
        let band = ctx.config.zones.target_band;
        self.in_thirds(&[band])
    }

    pub fn region_at(
        mut self,
        anchor: Anchor,
        thirds: Option<&[Third]>,
        lanes: Option<&[Lane]>,
    ) -> Self {
        self.regions.push((
            anchor,
            Region {
                thirds: thirds.map(|t| t.to_vec()),
                lanes: lanes.map(|l| l.to_vec()),
            },
        ));
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    fn matches_non_spatial(&self, ctx: &MatchContext, event: &Event) -> bool {
        self.actor.map_or(true, |s| s.matches(ctx, event.team_id))
            && self
                .possession
                .map_or(true, |s| s.matches(ctx, event.possession_team_id))
            && self.kinds.as_ref().map_or(true, |k| k.contains(&event.kind))
            && self.conditions.iter().all(|c| c(ctx, event))
    }

    pub fn apply<'a, I>(&self, ctx: &MatchContext, events: I) -> Subset<'a>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut subset = Subset::default();
        'events: for event in events {
            if !self.matches_non_spatial(ctx, event) {
                continue;
            }
            for (anchor, region) in &self.regions {
                let located = match anchor {
                    Anchor::Start => ctx.locate(event),
                    Anchor::End => ctx.locate_end(event),
                };
                match located.zone() {
                    Some(zone) if region.contains(zone) => {}
                    Some(_) => continue 'events,
                    None => {
                        located.record_exclusion(&mut subset.excluded);
                        continue 'events;
                    }
                }
            }
            subset.events.push(event);
        }
        subset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventDetails, PassDetails};

    const US: TeamId = 1;
    const THEM: TeamId = 2;

    fn ctx() -> MatchContext {
        MatchContext::new(ExtractionConfig::new(US))
    }

    fn pass(length: f64, start_x: f64, end_x: f64) -> Event {
        Event::new(1, 1, 10.0, EventKind::Pass, THEM, THEM, 1)
            .with_location(start_x, 40.0)
            .with_details(EventDetails::Pass(PassDetails {
                length: Some(length),
                end_location: Some(Location::new(end_x, 40.0)),
                ..Default::default()
            }))
    }

    #[test]
    fn test_progressive_pass_default_thresholds() {
        assert!(is_progressive_pass(&pass(15.0, 50.0, 58.0), 10.0, 5.0));
        assert!(!is_progressive_pass(&pass(15.0, 50.0, 53.0), 10.0, 5.0));
        assert!(!is_progressive_pass(&pass(9.0, 50.0, 58.0), 10.0, 5.0));
        assert!(is_progressive_pass_cfg(&ctx(), &pass(15.0, 50.0, 58.0)));
    }

    #[test]
    fn test_progressive_false_without_payload() {
        let bare = Event::new(1, 1, 10.0, EventKind::Pass, THEM, THEM, 1).with_location(50.0, 40.0);
        assert!(!is_progressive_pass(&bare, 10.0, 5.0));
        assert!(!is_through_ball(&bare));
        assert!(!is_switch(&bare));
    }

    #[test]
    fn test_ownership_predicates() {
        let c = ctx();
        let theirs = Event::new(1, 1, 0.0, EventKind::Pass, THEM, THEM, 1);
        let ours_defending = Event::new(2, 1, 0.0, EventKind::Pressure, US, THEM, 1);
        assert!(is_opponent_event(&c, &theirs));
        assert!(is_opponent_possession(&c, &ours_defending));
        assert!(is_team_action(&c, &ours_defending));
        assert!(!is_opponent_event(&c, &ours_defending));
    }

    #[test]
    fn test_filter_counts_missing_locations_separately() {
        let c = ctx();
        let events = vec![
            Event::new(1, 1, 0.0, EventKind::Interception, US, THEM, 1).with_location(60.0, 40.0),
            Event::new(2, 1, 1.0, EventKind::Interception, US, THEM, 1),
            Event::new(3, 1, 2.0, EventKind::Interception, US, THEM, 1).with_location(20.0, 40.0),
            Event::new(4, 1, 3.0, EventKind::Interception, US, THEM, 1).with_location(130.0, 40.0),
            // Not an interception: never reaches the spatial check
            Event::new(5, 1, 4.0, EventKind::Pressure, US, THEM, 1),
        ];
        let subset = EventFilter::our_defending()
            .kind(EventKind::Interception)
            .in_target_band(&c)
            .apply(&c, &events);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.excluded.missing_location, 1);
        assert_eq!(subset.excluded.out_of_range, 1);

        let all = EventFilter::our_defending()
            .kind(EventKind::Interception)
            .apply(&c, &events);
        assert_eq!(all.len(), 4);
        assert!(all.excluded.is_empty());
    }

    #[test]
    fn test_filter_end_anchor_and_condition() {
        let c = ctx();
        let events = vec![pass(15.0, 30.0, 58.0), pass(15.0, 50.0, 90.0)];
        let into_final = EventFilter::opponent_events()
            .region_at(Anchor::End, Some(&[Third::Final]), None)
            .when(is_progressive_pass_cfg)
            .apply(&c, &events);
        assert_eq!(into_final.len(), 1);
    }

    #[test]
    fn test_in_zone_none_without_location() {
        let c = ctx();
        let ev = Event::new(1, 1, 0.0, EventKind::Pressure, US, THEM, 1);
        assert_eq!(in_zone(&c, &ev, &[]), None);
    }
}
