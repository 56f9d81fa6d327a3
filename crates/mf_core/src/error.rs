use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Location ({x}, {y}) outside pitch bounds [0, {length}] x [0, {width}]")]
    OutOfRange {
        x: f64,
        y: f64,
        length: f64,
        width: f64,
    },

    #[error("Malformed event stream: sequence index {current} does not follow {previous}")]
    MalformedStream { previous: u64, current: u64 },

    #[error("Invalid weight config for '{index}': {reason}")]
    InvalidWeightConfig { index: String, reason: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Schema version mismatch: found {found}, expected {expected}")]
    SchemaVersion { found: u8, expected: u8 },
}

impl ExtractError {
    /// Whether the whole extraction must stop.
    ///
    /// A coordinate outside the pitch only invalidates the spatial features of
    /// that one event; ordering and configuration problems abort the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ExtractError::OutOfRange { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_is_not_fatal() {
        let err = ExtractError::OutOfRange {
            x: 130.0,
            y: 10.0,
            length: 120.0,
            width: 80.0,
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("130"));
    }

    #[test]
    fn test_structural_errors_are_fatal() {
        assert!(ExtractError::MalformedStream { previous: 4, current: 4 }.is_fatal());
        assert!(ExtractError::InvalidWeightConfig {
            index: "access_control_index".to_string(),
            reason: "weights sum to 0.9".to_string(),
        }
        .is_fatal());
    }
}
