//! # Extraction Pipeline
//!
//! One uniform reduction for every aggregation level: build explicit
//! `(level, key)` scopes, then run every registered feature that applies to
//! the scope's level.
//!
//! ## Steps
//! 1. Validate the configuration (weights, bands, windows)
//! 2. Reject non-increasing sequence indices
//! 3. Log every location outside the pitch (kept, but excluded spatially)
//! 4. Segment possessions (optionally reconciling a companion table)
//! 5. Build scopes for all six levels
//! 6. Compute records in parallel, one record per scope
//! 7. Attach composite indices and match-level risk flags
//!
//! ## Attribution
//! | Level | Events | Possessions |
//! |-------|--------|-------------|
//! | match | all | all |
//! | period | of the period | starting in it |
//! | time window | in the bucket | first event in the bucket |
//! | zone | located in the cell | start location in the cell |
//! | possession | of the unit | the unit |
//! | player | acted by the player | all |

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::analysis::bypass::{detect, detect_within_window};
use crate::analysis::composite::{risk_factors, CompositeScorer};
use crate::analysis::features::{span_minutes, FeatureContext, Registry, Scope, TEAM_LEVELS};
use crate::analysis::possession::{check_ordering, segment, segment_with_table};
use crate::analysis::predicates::{Located, MatchContext};
use crate::analysis::zones::ZoneLabel;
use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::models::{
    AggregationLevel, Event, Exclusions, FeatureRecord, FeatureTable, Possession, PossessionRow,
    RecordKey,
};

/// Validated configuration plus everything derived from it.
#[derive(Debug, Clone)]
pub struct Extractor {
    ctx: MatchContext,
    registry: Registry,
    scorer: CompositeScorer,
}

impl Extractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        let registry = Registry::from_config(&config);
        let scorer = CompositeScorer::new(config.composites.clone())?;
        Ok(Self {
            ctx: MatchContext::new(config),
            registry,
            scorer,
        })
    }

    pub fn context(&self) -> &MatchContext {
        &self.ctx
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Full batch run over one match.
    pub fn extract(
        &self,
        events: &[Event],
        possession_table: Option<&[PossessionRow]>,
    ) -> Result<FeatureTable> {
        check_ordering(events)?;
        info!(
            events = events.len(),
            target_team = self.ctx.target_team(),
            "feature extraction started"
        );
        self.report_out_of_range(events);

        let mode = self.ctx.config.segmentation;
        let possessions = match possession_table {
            Some(table) => segment_with_table(events, mode, table)?,
            None => segment(events, mode)?,
        };

        let fcx = FeatureContext::new(&self.ctx, events, &possessions);
        let scopes = self.build_scopes(events, &possessions);
        debug!(scopes = scopes.len(), "aggregation scopes built");

        let records: Vec<FeatureRecord> = scopes
            .par_iter()
            .map(|(scope, scope_exclusions)| {
                let mut record = self.compute(scope, &fcx);
                record.scope_exclusions = *scope_exclusions;
                record
            })
            .collect();

        let table = FeatureTable::from_records(records);
        info!(
            possessions = possessions.len(),
            records = table.len(),
            "feature extraction finished"
        );
        Ok(table)
    }

    fn report_out_of_range(&self, events: &[Event]) {
        for event in events {
            for (anchor, located) in [
                ("start", self.ctx.locate(event)),
                ("end", self.ctx.locate_end(event)),
            ] {
                if located == Located::OutOfRange {
                    warn!(
                        event = event.index,
                        anchor = anchor,
                        "location outside pitch bounds; excluded from spatial features"
                    );
                }
            }
        }
    }

    /// Every registered feature for the scope's level, plus composites and flags.
    pub fn compute<'a>(&self, scope: &Scope<'a>, fcx: &FeatureContext<'a>) -> FeatureRecord {
        let level = scope.key.level;
        let mut record = FeatureRecord::new(scope.key.clone());
        for def in self.registry.for_level(level) {
            let measured = def.compute(scope, fcx);
            record.insert(def.name.clone(), measured.value, measured.excluded);
        }

        if level == AggregationLevel::Possession {
            if let Some(possession) = scope.possessions.first() {
                let classifier = &self.ctx.classifier;
                record.insert(
                    "bypass_label",
                    detect(possession, classifier).as_feature(),
                    Exclusions::default(),
                );
                record.insert(
                    "bypass_label_windowed",
                    detect_within_window(
                        possession,
                        classifier,
                        &self.ctx.clock,
                        &self.ctx.config.bypass,
                    )
                    .as_feature(),
                    Exclusions::default(),
                );
            }
        }

        if TEAM_LEVELS.contains(&level) {
            for (name, value) in self.scorer.score_record(&record) {
                record.insert(name, value, Exclusions::default());
            }
        }
        if level == AggregationLevel::Match {
            record.flags = risk_factors(&record, &self.ctx.config.risk)
                .iter()
                .map(|f| f.as_str().to_string())
                .collect();
        }

        debug!(scope = %record.key, features = record.values.len(), "scope computed");
        record
    }

    /// Record of a single closed possession.
    pub fn possession_record(&self, possession: &Possession) -> FeatureRecord {
        let fcx = FeatureContext::new(
            &self.ctx,
            &possession.events,
            std::slice::from_ref(possession),
        );
        self.compute(&possession_scope(possession), &fcx)
    }

    fn build_scopes<'a>(
        &self,
        events: &'a [Event],
        possessions: &'a [Possession],
    ) -> Vec<(Scope<'a>, Exclusions)> {
        let none = Exclusions::default();
        let match_minutes = span_minutes(events);
        let mut scopes = vec![(
            Scope::new(
                RecordKey::match_level(),
                events.iter().collect(),
                possessions.iter().collect(),
            )
            .with_duration(match_minutes),
            none,
        )];

        // Periods
        let periods: BTreeSet<u8> = events.iter().map(|e| e.period).collect();
        for period in periods {
            let evs: Vec<&Event> = events.iter().filter(|e| e.period == period).collect();
            let minutes = span_minutes(evs.iter().copied());
            let ps = possessions.iter().filter(|p| p.period() == period).collect();
            scopes.push((
                Scope::new(
                    RecordKey::new(AggregationLevel::Period, period.to_string()),
                    evs,
                    ps,
                )
                .with_duration(minutes),
                none,
            ));
        }

        // Time windows
        let width = self.ctx.config.windows.time_window_minutes;
        let bucket_of = |e: &Event| {
            let bucket = (e.timestamp_s / 60.0 / width).floor().max(0.0) as u64;
            (e.period, bucket)
        };
        let mut buckets: BTreeMap<(u8, u64), (Vec<&Event>, Vec<&Possession>)> = BTreeMap::new();
        for e in events {
            buckets.entry(bucket_of(e)).or_default().0.push(e);
        }
        for p in possessions {
            if let Some(first) = p.events.first() {
                buckets.entry(bucket_of(first)).or_default().1.push(p);
            }
        }
        for ((period, bucket), (evs, ps)) in buckets {
            let start = bucket as f64 * width;
            let key = format!("p{}:{}-{}", period, start, start + width);
            let minutes = span_minutes(evs.iter().copied());
            scopes.push((
                Scope::new(RecordKey::new(AggregationLevel::TimeWindow, key), evs, ps)
                    .with_duration(minutes),
                none,
            ));
        }

        // Zones
        let mut unplaced = Exclusions::default();
        let mut cells: BTreeMap<ZoneLabel, Vec<&Event>> = BTreeMap::new();
        for e in events {
            match self.ctx.locate(e) {
                Located::At(_, zone) => cells.entry(zone).or_default().push(e),
                Located::Missing => unplaced.missing_location += 1,
                Located::OutOfRange => unplaced.out_of_range += 1,
            }
        }
        for zone in ZoneLabel::all() {
            let evs = cells.remove(&zone).unwrap_or_default();
            let ps = possessions
                .iter()
                .filter(|p| {
                    p.start_location()
                        .and_then(|loc| self.ctx.classifier.classify_location(&loc).ok())
                        == Some(zone)
                })
                .collect();
            scopes.push((
                Scope::new(RecordKey::new(AggregationLevel::Zone, zone.key()), evs, ps)
                    .with_duration(match_minutes),
                unplaced,
            ));
        }

        // Possessions
        scopes.extend(possessions.iter().map(|p| (possession_scope(p), none)));

        // Players of the target team
        let us = self.ctx.target_team();
        let players: BTreeSet<_> = events
            .iter()
            .filter(|e| e.team_id == us)
            .filter_map(|e| e.player_id)
            .collect();
        for player in players {
            let evs = events
                .iter()
                .filter(|e| e.team_id == us && e.player_id == Some(player))
                .collect();
            scopes.push((
                Scope::new(
                    RecordKey::new(AggregationLevel::Player, player.to_string()),
                    evs,
                    possessions.iter().collect(),
                )
                .with_duration(match_minutes)
                .with_player(player),
                none,
            ));
        }

        scopes
    }
}

fn possession_scope(possession: &Possession) -> Scope<'_> {
    Scope::new(
        RecordKey::new(AggregationLevel::Possession, possession.key.to_string()),
        possession.events.iter().collect(),
        vec![possession],
    )
    .with_duration(Some(possession.duration_s() / 60.0))
}

/// Validate `config`, then run a full extraction.
pub fn extract(
    events: &[Event],
    possession_table: Option<&[PossessionRow]>,
    config: &ExtractionConfig,
) -> Result<FeatureTable> {
    Extractor::new(config.clone())?.extract(events, possession_table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::models::{EventKind, FeatureValue, TeamId};

    const US: TeamId = 1;
    const THEM: TeamId = 2;

    fn ev(index: u64, period: u8, t: f64, kind: EventKind, team: TeamId, possession: u32) -> Event {
        Event::new(index, period, t, kind, team, team, possession)
    }

    fn stream() -> Vec<Event> {
        vec![
            ev(1, 1, 10.0, EventKind::Pass, THEM, 1).with_location(35.0, 40.0),
            ev(2, 1, 14.0, EventKind::Carry, THEM, 1).with_location(85.0, 40.0),
            ev(3, 1, 1000.0, EventKind::Pass, US, 2)
                .with_location(60.0, 20.0)
                .with_player(8),
            ev(4, 1, 1004.0, EventKind::Pass, US, 2).with_player(10),
            ev(5, 2, 30.0, EventKind::Pass, THEM, 3).with_location(50.0, 60.0),
            ev(6, 2, 34.0, EventKind::Pass, THEM, 3).with_location(130.0, 60.0),
        ]
    }

    fn keys(table: &FeatureTable, level: AggregationLevel) -> Vec<String> {
        table.level(level).map(|r| r.key.key.clone()).collect()
    }

    #[test]
    fn test_scopes_for_every_level() {
        let table = extract(&stream(), None, &ExtractionConfig::new(US)).unwrap();
        assert_eq!(keys(&table, AggregationLevel::Match), vec!["match"]);
        assert_eq!(keys(&table, AggregationLevel::Period), vec!["1", "2"]);
        assert_eq!(
            keys(&table, AggregationLevel::TimeWindow),
            vec!["p1:0-15", "p1:15-30", "p2:0-15"]
        );
        assert_eq!(table.level(AggregationLevel::Zone).count(), 9);
        assert_eq!(
            keys(&table, AggregationLevel::Possession),
            vec!["1@1", "2@3", "3@5"]
        );
        assert_eq!(keys(&table, AggregationLevel::Player), vec!["10", "8"]);
    }

    #[test]
    fn test_possession_records_carry_bypass_labels() {
        let table = extract(&stream(), None, &ExtractionConfig::new(US)).unwrap();
        let first = table.get(AggregationLevel::Possession, "1@1").unwrap();
        assert_eq!(first.get("bypass_label"), FeatureValue::Value(1.0));
        assert_eq!(first.get("bypass_label_windowed"), FeatureValue::Value(1.0));
        let ours = table.get(AggregationLevel::Possession, "2@3").unwrap();
        assert_eq!(ours.get("bypass_label"), FeatureValue::Value(0.0));
        // Possession-level records do not carry team features
        assert!(!ours.values.contains_key("passes_allowed"));
    }

    #[test]
    fn test_zone_records_count_unplaced_events() {
        let table = extract(&stream(), None, &ExtractionConfig::new(US)).unwrap();
        let zone = table.get(AggregationLevel::Zone, "midfield_left").unwrap();
        assert_eq!(zone.scope_exclusions.missing_location, 1);
        assert_eq!(zone.scope_exclusions.out_of_range, 1);
    }

    #[test]
    fn test_match_record_has_composites() {
        let table = extract(&stream(), None, &ExtractionConfig::new(US)).unwrap();
        let record = table.match_record().unwrap();
        assert!(record.values.contains_key("access_control_index"));
        assert!(record.values.contains_key("bypass_risk_score"));
        // One attempt among two opponent possessions
        assert_eq!(record.get("bypass_prevention_rate"), FeatureValue::Value(0.5));
        assert!(record.flags.is_empty());
    }

    #[test]
    fn test_malformed_stream_aborts() {
        let mut events = stream();
        events.swap(1, 2);
        let err = extract(&events, None, &ExtractionConfig::new(US)).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedStream { .. }));
    }

    #[test]
    fn test_bad_weights_abort_before_extraction() {
        let mut config = ExtractionConfig::new(US);
        config.composites[0].components[0].weight = 0.9;
        let err = extract(&stream(), None, &config).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidWeightConfig { .. }));
    }

    #[test]
    fn test_possession_table_overrides_nothing_on_agreement() {
        let table_rows = vec![
            PossessionRow { id: 1, team_id: THEM },
            PossessionRow { id: 2, team_id: US },
        ];
        let config = ExtractionConfig::new(US);
        let with_table = extract(&stream(), Some(&table_rows), &config).unwrap();
        let without = extract(&stream(), None, &ExtractionConfig::new(US)).unwrap();
        assert_eq!(with_table, without);
    }
}
