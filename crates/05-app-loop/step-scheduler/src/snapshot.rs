//! Serializable view of the scheduler for settings panels and logs.

use serde::Serialize;

/// Read-only view of the scheduler, serialized with camelCase keys.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSnapshot {
    pub running: bool,
    /// Configured ticks per second; `0` when display-tied.
    pub target_rate: f64,
    /// Stored interpolation flag, reported even while display-tied.
    pub interpolation_enabled: bool,
    /// Milliseconds per tick as published to the engine.
    pub tick_interval_ms: f64,
    /// [`StepMode::label`](crate::StepMode::label) of the current config.
    pub mode: &'static str,
    pub step_source_live: bool,
    pub interpolation_source_live: bool,
    /// Reconfiguration restarts performed while running.
    pub restarts: u64,
}

impl SchedulerSnapshot {
    /// Serializes to a single JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
