//! # mf_core - Deterministic Event-Stream Feature Extraction
//!
//! Turns an ordered football event stream into possession-segmented,
//! zone-classified, time-windowed features describing how well one team
//! keeps the opponent from advancing the ball through a pitch region.
//!
//! ## Features
//! - Possession segmentation with explicit (id, first index) keys
//! - Nine-cell zone classification driven by configuration
//! - Ten feature categories at six aggregation levels
//! - Bypass labels and bounded composite indices
//! - Same input, byte-identical JSON output
//!
//! ## Usage
//!
//! ```rust
//! use mf_core::{extract, Event, EventKind, ExtractionConfig};
//!
//! let events = vec![
//!     Event::new(1, 1, 0.0, EventKind::Pass, 2, 2, 1).with_location(35.0, 40.0),
//!     Event::new(2, 1, 4.0, EventKind::Carry, 2, 2, 1).with_location(85.0, 40.0),
//! ];
//! let table = extract(&events, None, &ExtractionConfig::new(1)).unwrap();
//! assert!(table.match_record().is_some());
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod models;

pub use analysis::bypass::{bypass_prevention_rate, detect, detect_within_window, BypassLabel};
pub use analysis::composite::{normalize, risk_factors, CompositeScorer, RiskFactor};
pub use analysis::pipeline::{extract, Extractor};
pub use analysis::possession::{segment, segment_with_table, SegmentationMode};
pub use analysis::stream::LiveExtractor;
pub use analysis::zones::{Lane, Third, ZoneClassifier, ZoneLabel};
pub use api::{extract_features_json, feature_table_schema, ExtractionRequest, ExtractionResponse};
pub use config::ExtractionConfig;
pub use error::{ExtractError, Result};
pub use models::{
    AggregationLevel, Event, EventDetails, EventKind, Exclusions, FeatureRecord, FeatureTable,
    FeatureValue, Location, Possession, PossessionKey, PossessionRow, RecordKey,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;
