use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::pipeline::extract;
use crate::config::ExtractionConfig;
use crate::error::{ExtractError, Result};
use crate::models::{Event, FeatureTable, PossessionRow};
use crate::SCHEMA_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub schema_version: u8,
    pub config: ExtractionConfig,
    pub events: Vec<Event>,
    /// Optional companion possession table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possessions: Option<Vec<PossessionRow>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionResponse {
    pub schema_version: u8,
    pub table: FeatureTable,
}

/// Main entry point for JSON API - extracts the feature table of one match
pub fn extract_features_json(request_json: &str) -> Result<String> {
    let request: ExtractionRequest = serde_json::from_str(request_json)?;

    if request.schema_version != SCHEMA_VERSION {
        return Err(ExtractError::SchemaVersion {
            found: request.schema_version,
            expected: SCHEMA_VERSION,
        });
    }

    let table = extract(
        &request.events,
        request.possessions.as_deref(),
        &request.config,
    )?;
    info!(records = table.len(), "json extraction complete");

    let response = ExtractionResponse {
        schema_version: SCHEMA_VERSION,
        table,
    };
    Ok(serde_json::to_string(&response)?)
}

/// JSON Schema of the response document.
pub fn feature_table_schema() -> Result<String> {
    let schema = schema_for!(ExtractionResponse);
    Ok(serde_json::to_string_pretty(&schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(version: u8) -> serde_json::Value {
        json!({
            "schema_version": version,
            "config": { "target_team": 1 },
            "events": [
                {
                    "id": "a", "index": 1, "period": 1, "timestamp_s": 0.0,
                    "kind": "pass", "team_id": 2, "possession_team_id": 2, "possession": 1,
                    "location": { "x": 35.0, "y": 40.0 }
                },
                {
                    "id": "b", "index": 2, "period": 1, "timestamp_s": 3.0,
                    "kind": "carry", "team_id": 2, "possession_team_id": 2, "possession": 1,
                    "location": { "x": 85.0, "y": 40.0 }
                },
                {
                    "id": "c", "index": 3, "period": 1, "timestamp_s": 6.0,
                    "kind": "interception", "team_id": 1, "possession_team_id": 1, "possession": 2
                }
            ]
        })
    }

    #[test]
    fn test_extract_features_json() {
        let out = extract_features_json(&request(1).to_string()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["schema_version"], 1);

        let records = parsed["table"]["records"].as_array().unwrap();
        let match_record = records.iter().find(|r| r["level"] == "match").unwrap();
        assert_eq!(match_record["values"]["bypass_prevention_rate"], json!(0.0));
        // No duel anywhere: undefined serializes as null, not 0
        assert!(match_record["values"]["duel_win_rate"].is_null());
    }

    #[test]
    fn test_wrong_schema_version() {
        let err = extract_features_json(&request(2).to_string()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::SchemaVersion {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn test_invalid_json() {
        let err = extract_features_json("{not json").unwrap_err();
        assert!(matches!(err, ExtractError::Serialization(_)));
    }

    #[test]
    fn test_response_round_trips() {
        let out = extract_features_json(&request(1).to_string()).unwrap();
        let response: ExtractionResponse = serde_json::from_str(&out).unwrap();
        assert_eq!(response.schema_version, SCHEMA_VERSION);
        assert!(response.table.match_record().is_some());
    }

    #[test]
    fn test_schema_mentions_records() {
        let schema = feature_table_schema().unwrap();
        assert!(schema.contains("ExtractionResponse"));
        assert!(schema.contains("records"));
    }
}
