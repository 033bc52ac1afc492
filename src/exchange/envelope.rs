use bytes::Bytes;
use crate::detection::DetectorUsed;
use crate::tracking::TrackerMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Read-only summary of one control cycle for external consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub mode: TrackerMode,
    pub target_present: bool,
    pub pan_angle: f64,
    pub tilt_angle: f64,
    pub fps_estimate: f64,
    pub detector_used: DetectorUsed,
    /// Confidence of the fused detection this cycle, if any
    pub confidence: Option<f32>,
    /// Smoothed normalized target center, if a target is held
    pub target_center: Option<(f64, f64)>,
    pub cycle: u64,
    pub updated_at: DateTime<Utc>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            mode: TrackerMode::Searching,
            target_present: false,
            pan_angle: 0.0,
            tilt_angle: 0.0,
            fps_estimate: 0.0,
            detector_used: DetectorUsed::None,
            confidence: None,
            target_center: None,
            cycle: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Annotated frame plus status, published once per cycle.
///
/// The frame is stored JPEG-encoded; cloning `jpeg` shares the buffer.
/// `sequence` is assigned by [`FrameExchange::publish`](super::FrameExchange::publish).
#[derive(Debug, Clone)]
pub struct FrameEnvelope {
    pub sequence: u64,
    pub jpeg: Bytes,
    pub width: u32,
    pub height: u32,
    pub status: StatusSnapshot,
    pub timestamp: SystemTime,
}

impl FrameEnvelope {
    pub fn new(jpeg: Vec<u8>, width: u32, height: u32, status: StatusSnapshot) -> Self {
        Self {
            sequence: 0,
            jpeg: Bytes::from(jpeg),
            width,
            height,
            status,
            timestamp: SystemTime::now(),
        }
    }
}
