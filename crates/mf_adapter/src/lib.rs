//! mf_adapter: StatsBomb-style event JSON -> mf_core events.
//!
//! Field naming belongs here; the core only sees [`mf_core::Event`].
//! Input is an in-memory JSON array of event objects. Events without an
//! `index` are numbered by their position in the array, starting at 1.

use thiserror::Error;
use tracing::info;

use mf_core::{Event, ExtractError, ExtractionConfig, FeatureTable};

pub mod mapper;
pub mod statsbomb;

pub use mapper::{event_kind, parse_timestamp, play_pattern, to_core_event};
pub use statsbomb::RawEvent;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Event {index}: unparseable timestamp '{value}'")]
    Timestamp { index: u64, value: String },

    #[error("Event {index}: missing field '{field}'")]
    MissingField { index: u64, field: &'static str },

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),
}

/// Map already-deserialized raw events, preserving their order.
pub fn from_raw_events(raw: &[RawEvent]) -> Result<Vec<Event>, AdapterError> {
    raw.iter()
        .zip(1u64..)
        .map(|(event, position)| to_core_event(event, position))
        .collect()
}

pub fn from_statsbomb_json(json: &str) -> Result<Vec<Event>, AdapterError> {
    let raw: Vec<RawEvent> = serde_json::from_str(json)?;
    let events = from_raw_events(&raw)?;
    info!(events = events.len(), "statsbomb events mapped");
    Ok(events)
}

/// Map and extract in one step.
pub fn extract_statsbomb(
    json: &str,
    config: &ExtractionConfig,
) -> Result<FeatureTable, AdapterError> {
    let events = from_statsbomb_json(json)?;
    Ok(mf_core::extract(&events, None, config)?)
}
