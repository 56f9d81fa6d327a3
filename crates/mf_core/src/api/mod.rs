pub mod json_api;

pub use json_api::{
    extract_features_json, feature_table_schema, ExtractionRequest, ExtractionResponse,
};
