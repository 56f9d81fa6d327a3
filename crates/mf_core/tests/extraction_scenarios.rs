//! End-to-end extraction scenarios over hand-built and synthetic streams.

mod common;

use common::{synthetic_match, THEM, US};
use mf_core::analysis::predicates::is_progressive_pass;
use mf_core::models::{EventDetails, PassDetails};
use mf_core::{
    detect, extract, segment, AggregationLevel, BypassLabel, Event, EventKind, ExtractError,
    ExtractionConfig, FeatureValue, Location, SegmentationMode, ZoneClassifier,
};

fn pass(index: u64, t: f64, team: u32, possession: u32, start: (f64, f64), end: (f64, f64)) -> Event {
    let length = ((end.0 - start.0).powi(2) + (end.1 - start.1).powi(2)).sqrt();
    Event::new(index, 1, t, EventKind::Pass, team, team, possession)
        .with_location(start.0, start.1)
        .with_details(EventDetails::Pass(PassDetails {
            end_location: Some(Location::new(end.0, end.1)),
            length: Some(length),
            ..Default::default()
        }))
}

#[test]
fn segmentation_partitions_synthetic_match() {
    let events = synthetic_match(7, 300);
    let possessions = segment(&events, SegmentationMode::ByPossessionId).unwrap();
    let rebuilt: Vec<u64> = possessions
        .iter()
        .flat_map(|p| p.events.iter().map(|e| e.index))
        .collect();
    let original: Vec<u64> = events.iter().map(|e| e.index).collect();
    assert_eq!(rebuilt, original);
    assert_eq!(possessions.len(), 300);
}

#[test]
fn bypass_scenarios() {
    let classifier = ZoneClassifier::new(Default::default());
    let attempt = segment(
        &[
            pass(1, 0.0, THEM, 1, (35.0, 40.0), (60.0, 40.0)),
            pass(2, 5.0, THEM, 1, (85.0, 40.0), (95.0, 40.0)),
        ],
        SegmentationMode::ByPossessionId,
    )
    .unwrap();
    assert_eq!(detect(&attempt[0], &classifier), BypassLabel::Attempt);

    let confined = segment(
        &[
            pass(1, 0.0, THEM, 1, (10.0, 40.0), (20.0, 40.0)),
            pass(2, 4.0, THEM, 1, (25.0, 30.0), (30.0, 40.0)),
            pass(3, 8.0, THEM, 1, (38.0, 40.0), (30.0, 40.0)),
        ],
        SegmentationMode::ByPossessionId,
    )
    .unwrap();
    assert_eq!(detect(&confined[0], &classifier), BypassLabel::NotAttempt);
}

#[test]
fn progressive_pass_scenario() {
    let progressive = Event::new(1, 1, 0.0, EventKind::Pass, THEM, THEM, 1)
        .with_location(50.0, 40.0)
        .with_details(EventDetails::Pass(PassDetails {
            end_location: Some(Location::new(58.0, 52.7)),
            length: Some(15.0),
            ..Default::default()
        }));
    let flat = Event::new(2, 1, 3.0, EventKind::Pass, THEM, THEM, 1)
        .with_location(50.0, 40.0)
        .with_details(EventDetails::Pass(PassDetails {
            end_location: Some(Location::new(53.0, 54.7)),
            length: Some(15.0),
            ..Default::default()
        }));
    assert!(is_progressive_pass(&progressive, 10.0, 5.0));
    assert!(!is_progressive_pass(&flat, 10.0, 5.0));

    let table = extract(&[progressive, flat], None, &ExtractionConfig::new(US)).unwrap();
    let record = table.match_record().unwrap();
    assert_eq!(record.get("progressive_passes_allowed"), FeatureValue::Value(1.0));
    assert_eq!(record.get("passes_allowed"), FeatureValue::Value(2.0));
}

#[test]
fn zero_opponent_possessions_leaves_prevention_undefined() {
    let events = vec![
        pass(1, 0.0, US, 1, (30.0, 40.0), (50.0, 40.0)),
        pass(2, 3.0, US, 1, (50.0, 40.0), (90.0, 40.0)),
    ];
    let table = extract(&events, None, &ExtractionConfig::new(US)).unwrap();
    let record = table.match_record().unwrap();
    assert_eq!(record.get("bypass_prevention_rate"), FeatureValue::Undefined);
    // The composite depending on it is undefined as well
    assert_eq!(record.get("access_control_index"), FeatureValue::Undefined);

    let json = serde_json::to_value(record).unwrap();
    assert!(json["values"]["bypass_prevention_rate"].is_null());
}

#[test]
fn missing_location_is_excluded_spatially_but_still_counted_by_kind() {
    let events = vec![
        pass(1, 0.0, THEM, 1, (50.0, 40.0), (60.0, 40.0)),
        Event::new(2, 1, 2.0, EventKind::Interception, US, THEM, 1),
        Event::new(3, 1, 4.0, EventKind::Interception, US, THEM, 1).with_location(60.0, 30.0),
        Event::new(4, 1, 6.0, EventKind::Pass, THEM, THEM, 1),
    ];
    let table = extract(&events, None, &ExtractionConfig::new(US)).unwrap();

    let record = table.match_record().unwrap();
    assert_eq!(record.get("defensive_actions_x_mean"), FeatureValue::Value(60.0));
    assert_eq!(record.exclusions["defensive_actions_x_mean"].missing_location, 1);

    let possession = table.get(AggregationLevel::Possession, "1@1").unwrap();
    assert_eq!(possession.get("possession_pass_count"), FeatureValue::Value(2.0));
    assert_eq!(possession.get("possession_event_count"), FeatureValue::Value(4.0));
}

#[test]
fn composites_stay_bounded_on_synthetic_matches() {
    for seed in 0..5 {
        let events = synthetic_match(seed, 200);
        let table = extract(&events, None, &ExtractionConfig::new(US)).unwrap();
        for record in &table.records {
            for name in ["access_control_index", "bypass_risk_score", "bypass_prevention_rate"] {
                if let FeatureValue::Value(v) = record.get(name) {
                    assert!((0.0..=1.0).contains(&v), "{} = {} on {}", name, v, record.key);
                }
            }
        }
    }
}

#[test]
fn clock_continuation_keeps_possession_scopes() {
    let events = synthetic_match(11, 120);
    let split = extract(&events, None, &ExtractionConfig::new(US)).unwrap();
    let continuous = extract(&events, None, &ExtractionConfig::continuous_clock(US)).unwrap();
    let keys = |t: &mf_core::FeatureTable| {
        t.level(AggregationLevel::Possession)
            .map(|r| r.key.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(keys(&split).len(), 120);
    assert_eq!(keys(&split), keys(&continuous));
}

#[test]
fn out_of_order_stream_is_fatal() {
    let events = vec![
        pass(2, 0.0, THEM, 1, (50.0, 40.0), (60.0, 40.0)),
        pass(1, 1.0, THEM, 1, (50.0, 40.0), (60.0, 40.0)),
    ];
    let err = extract(&events, None, &ExtractionConfig::new(US)).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ExtractError::MalformedStream { previous: 2, current: 1 }));
}

#[test]
fn out_of_range_location_does_not_abort() {
    let events = vec![
        pass(1, 0.0, THEM, 1, (50.0, 40.0), (60.0, 40.0)),
        Event::new(2, 1, 2.0, EventKind::Interception, US, THEM, 1).with_location(130.0, 40.0),
    ];
    let table = extract(&events, None, &ExtractionConfig::new(US)).unwrap();
    let record = table.match_record().unwrap();
    assert_eq!(record.get("defensive_actions_x_mean"), FeatureValue::Undefined);
    assert_eq!(record.exclusions["defensive_actions_x_mean"].out_of_range, 1);
}
