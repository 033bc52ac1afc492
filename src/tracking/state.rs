use crate::detection::{BoundingBox, TargetClass};
use serde::{Deserialize, Serialize};

/// Which control law drives the actuator this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerMode {
    /// No recent target; the scan pattern runs
    #[default]
    Searching,
    /// Target visible recently; the proportional controller runs
    Tracking,
    /// Target briefly lost; the actuator holds its last angles
    Reacquiring,
}

impl TrackerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerMode::Searching => "SEARCHING",
            TrackerMode::Tracking => "TRACKING",
            TrackerMode::Reacquiring => "REACQUIRING",
        }
    }

    /// Short operator-facing label for the HUD
    pub fn status_text(&self) -> &'static str {
        match self {
            TrackerMode::Searching => "Scanning",
            TrackerMode::Tracking => "Tracking",
            TrackerMode::Reacquiring => "Target lost (hold)",
        }
    }
}

impl std::fmt::Display for TrackerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mode change produced by one tracker update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: TrackerMode,
    pub to: TrackerMode,
    pub cycle: u64,
}

/// The target the tracker currently believes in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedTarget {
    /// Smoothed center, normalized to [-1, 1] per axis around the frame center
    pub center: (f64, f64),
    pub confidence: f32,
    pub class: TargetClass,
    /// Consecutive cycles in which the target was seen
    pub age: u32,
    /// Cycle index of the most recent sighting
    pub last_seen: u64,
    /// Raw pixel box of the most recent sighting
    pub last_box: BoundingBox,
}
