//! CLI-facing result types, serialized as-is in `--json` mode.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::models::Feature;
use crate::services::RateTable;

/// One simulated turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationStep {
    pub turn: usize,
    pub input: f64,
    pub target: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub feature: Feature,
    pub steps: Vec<SimulationStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub path: String,
    pub calibrated_at: DateTime<Utc>,
    pub attempted: usize,
    pub samples: usize,
    pub table: RateTable,
}
