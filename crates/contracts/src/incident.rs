//! Incident state vocabulary shared by the engine, recorder and pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Incident state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentState {
    /// No presence streak
    #[default]
    Idle,
    /// Presence streak in progress, persistence threshold not yet exceeded
    Triggering,
    /// Recording session open
    Recording,
}

impl IncidentState {
    /// Numeric encoding for gauges
    pub fn as_gauge(self) -> f64 {
        match self {
            IncidentState::Idle => 0.0,
            IncidentState::Triggering => 1.0,
            IncidentState::Recording => 2.0,
        }
    }
}

impl fmt::Display for IncidentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IncidentState::Idle => "idle",
            IncidentState::Triggering => "triggering",
            IncidentState::Recording => "recording",
        };
        f.write_str(name)
    }
}

/// Action emitted by the state machine on a Recording boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentAction {
    /// Triggering -> Recording; `at` is the frame timestamp
    Start { at: f64 },
    /// Recording -> Idle; `at` is the frame timestamp
    Stop { at: f64 },
}
