//! Feature table model
//!
//! Output of one extraction run. Every record is keyed by (level, key) and
//! maps feature names to a value or an explicit undefined marker.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

/// Feature value; `Undefined` serializes as `null`, never as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FeatureValue {
    Value(f64),
    Undefined,
}

impl FeatureValue {
    /// Wrap a computed number; non-finite results become undefined.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            FeatureValue::Value(value)
        } else {
            FeatureValue::Undefined
        }
    }

    pub fn count(n: usize) -> Self {
        FeatureValue::Value(n as f64)
    }

    /// `numerator / denominator`, undefined when the denominator is zero.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            FeatureValue::Undefined
        } else {
            Self::from_f64(numerator / denominator)
        }
    }

    pub fn from_option(value: Option<f64>) -> Self {
        value.map_or(FeatureValue::Undefined, Self::from_f64)
    }

    pub fn as_option(&self) -> Option<f64> {
        match self {
            FeatureValue::Value(v) => Some(*v),
            FeatureValue::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, FeatureValue::Value(_))
    }
}

impl From<Option<f64>> for FeatureValue {
    fn from(value: Option<f64>) -> Self {
        Self::from_option(value)
    }
}

/// Events dropped from a feature because a spatial filter could not be
/// evaluated for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Exclusions {
    pub missing_location: u32,
    pub out_of_range: u32,
}

impl Exclusions {
    pub fn is_empty(&self) -> bool {
        self.missing_location == 0 && self.out_of_range == 0
    }

    pub fn total(&self) -> u32 {
        self.missing_location + self.out_of_range
    }
}

impl AddAssign for Exclusions {
    fn add_assign(&mut self, rhs: Self) {
        self.missing_location += rhs.missing_location;
        self.out_of_range += rhs.out_of_range;
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AggregationLevel {
    Match,
    Period,
    TimeWindow,
    Zone,
    Possession,
    Player,
}

impl AggregationLevel {
    pub const ALL: [AggregationLevel; 6] = [
        AggregationLevel::Match,
        AggregationLevel::Period,
        AggregationLevel::TimeWindow,
        AggregationLevel::Zone,
        AggregationLevel::Possession,
        AggregationLevel::Player,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationLevel::Match => "match",
            AggregationLevel::Period => "period",
            AggregationLevel::TimeWindow => "time_window",
            AggregationLevel::Zone => "zone",
            AggregationLevel::Possession => "possession",
            AggregationLevel::Player => "player",
        }
    }
}

impl fmt::Display for AggregationLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (level, key) pair identifying one output row.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct RecordKey {
    pub level: AggregationLevel,
    pub key: String,
}

impl RecordKey {
    pub fn new(level: AggregationLevel, key: impl Into<String>) -> Self {
        Self {
            level,
            key: key.into(),
        }
    }

    pub fn match_level() -> Self {
        Self::new(AggregationLevel::Match, "match")
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.level, self.key)
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureRecord {
    #[serde(flatten)]
    pub key: RecordKey,
    pub values: BTreeMap<String, FeatureValue>,
    /// Per-feature exclusion counts (only features that excluded something).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exclusions: BTreeMap<String, Exclusions>,
    /// Events of the scope itself that could not be placed (zone level).
    #[serde(default, skip_serializing_if = "Exclusions::is_empty")]
    pub scope_exclusions: Exclusions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

impl FeatureRecord {
    pub fn new(key: RecordKey) -> Self {
        Self {
            key,
            values: BTreeMap::new(),
            exclusions: BTreeMap::new(),
            scope_exclusions: Exclusions::default(),
            flags: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FeatureValue, excluded: Exclusions) {
        let name = name.into();
        if !excluded.is_empty() {
            self.exclusions.insert(name.clone(), excluded);
        }
        self.values.insert(name, value);
    }

    /// Value of a feature; missing names read as undefined.
    pub fn get(&self, name: &str) -> FeatureValue {
        self.values
            .get(name)
            .copied()
            .unwrap_or(FeatureValue::Undefined)
    }
}

/// Full result of one extraction run, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureTable {
    pub records: Vec<FeatureRecord>,
}

impl FeatureTable {
    pub fn from_records(records: impl IntoIterator<Item = FeatureRecord>) -> Self {
        let sorted: BTreeMap<RecordKey, FeatureRecord> = records
            .into_iter()
            .map(|r| (r.key.clone(), r))
            .collect();
        Self {
            records: sorted.into_values().collect(),
        }
    }

    pub fn get(&self, level: AggregationLevel, key: &str) -> Option<&FeatureRecord> {
        self.records
            .iter()
            .find(|r| r.key.level == level && r.key.key == key)
    }

    pub fn match_record(&self) -> Option<&FeatureRecord> {
        self.get(AggregationLevel::Match, "match")
    }

    pub fn level(&self, level: AggregationLevel) -> impl Iterator<Item = &FeatureRecord> {
        self.records.iter().filter(move |r| r.key.level == level)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_with_zero_denominator_is_undefined() {
        assert_eq!(FeatureValue::ratio(3.0, 0.0), FeatureValue::Undefined);
        assert_eq!(FeatureValue::ratio(0.0, 4.0), FeatureValue::Value(0.0));
    }

    #[test]
    fn test_non_finite_becomes_undefined() {
        assert_eq!(FeatureValue::from_f64(f64::NAN), FeatureValue::Undefined);
        assert_eq!(FeatureValue::from_f64(f64::INFINITY), FeatureValue::Undefined);
    }

    #[test]
    fn test_undefined_serializes_as_null() {
        let mut record = FeatureRecord::new(RecordKey::match_level());
        record.insert("a", FeatureValue::Undefined, Exclusions::default());
        record.insert("b", FeatureValue::Value(0.0), Exclusions::default());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["values"]["a"].is_null());
        assert_eq!(json["values"]["b"], serde_json::json!(0.0));
        assert_eq!(json["level"], "match");

        let back: FeatureRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.get("a"), FeatureValue::Undefined);
        assert_eq!(back.get("b"), FeatureValue::Value(0.0));
    }

    #[test]
    fn test_exclusions_only_recorded_when_nonzero() {
        let mut record = FeatureRecord::new(RecordKey::match_level());
        record.insert("kept", FeatureValue::Value(1.0), Exclusions::default());
        record.insert(
            "spatial",
            FeatureValue::Value(2.0),
            Exclusions {
                missing_location: 3,
                out_of_range: 0,
            },
        );
        assert_eq!(record.exclusions.len(), 1);
        assert_eq!(record.exclusions["spatial"].missing_location, 3);
    }

    #[test]
    fn test_table_sorted_by_key() {
        let table = FeatureTable::from_records(vec![
            FeatureRecord::new(RecordKey::new(AggregationLevel::Player, "9")),
            FeatureRecord::new(RecordKey::match_level()),
            FeatureRecord::new(RecordKey::new(AggregationLevel::Period, "1")),
        ]);
        let levels: Vec<_> = table.records.iter().map(|r| r.key.level).collect();
        assert_eq!(
            levels,
            vec![
                AggregationLevel::Match,
                AggregationLevel::Period,
                AggregationLevel::Player
            ]
        );
        assert!(table.match_record().is_some());
    }
}
