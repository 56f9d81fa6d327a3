//! Wire shape of a StatsBomb-style event object.
//!
//! Only the attributes the core reads are declared; everything else in the
//! payload is ignored by serde.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Named {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub index: Option<u64>,
    pub period: u8,
    /// `HH:MM:SS.mmm` since the start of the period.
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: Named,
    pub team: Named,
    pub possession_team: Named,
    pub possession: u32,
    #[serde(default)]
    pub player: Option<Named>,
    #[serde(default)]
    pub location: Option<Vec<f64>>,
    #[serde(default)]
    pub under_pressure: Option<bool>,
    #[serde(default)]
    pub counterpress: Option<bool>,
    #[serde(default)]
    pub play_pattern: Option<Named>,
    #[serde(default)]
    pub pass: Option<RawPass>,
    #[serde(default)]
    pub carry: Option<RawCarry>,
    #[serde(default)]
    pub duel: Option<RawDuel>,
    #[serde(default)]
    pub interception: Option<RawOutcome>,
    #[serde(default)]
    pub ball_recovery: Option<RawRecovery>,
    #[serde(default)]
    pub shot: Option<RawOutcome>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPass {
    #[serde(default)]
    pub end_location: Option<Vec<f64>>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub angle: Option<f64>,
    #[serde(default)]
    pub outcome: Option<Named>,
    #[serde(default)]
    pub technique: Option<Named>,
    #[serde(default)]
    pub through_ball: Option<bool>,
    #[serde(default)]
    pub switch: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCarry {
    #[serde(default)]
    pub end_location: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDuel {
    #[serde(default, rename = "type")]
    pub duel_type: Option<Named>,
    #[serde(default)]
    pub outcome: Option<Named>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOutcome {
    #[serde(default)]
    pub outcome: Option<Named>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecovery {
    #[serde(default)]
    pub recovery_failure: Option<bool>,
}
