use super::actuator::AxisLimits;
use crate::config::{ScanConfig, ServoConfig};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Which way the pan sweep is currently travelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDirection {
    /// Toward `max`
    Ascending,
    /// Toward `min`
    Descending,
}

/// Autonomous sweep used while no target is tracked.
///
/// Pan follows a triangle wave between its limits at `step` degrees per
/// cycle. Tilt is a slower sinusoid slaved to pan, so one full pan sweep
/// carries `tilt_waves` tilt oscillations. The angles are a pure function of
/// the cycle index relative to an anchor; [`ScanPattern::resume_from`] moves
/// the anchor so the sweep picks up at the current pan angle.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPattern {
    pan: AxisLimits,
    tilt: AxisLimits,
    step: f64,
    tilt_amplitude: f64,
    tilt_waves: f64,
    anchor_cycle: u64,
    anchor_phase: f64,
}

impl ScanPattern {
    pub fn new(pan: AxisLimits, tilt: AxisLimits, config: &ScanConfig) -> Self {
        let mut pattern = Self {
            pan,
            tilt,
            step: config.step_degrees.abs(),
            tilt_amplitude: config.tilt_amplitude.abs(),
            tilt_waves: config.tilt_waves,
            anchor_cycle: 0,
            anchor_phase: 0.0,
        };
        pattern.anchor_phase = pattern.phase_of(pan.center, ScanDirection::Ascending);
        pattern
    }

    pub fn from_config(servo: &ServoConfig, scan: &ScanConfig) -> Self {
        Self::new(servo.pan.into(), servo.tilt.into(), scan)
    }

    /// Angles for a cycle index. Same index, same anchor, same angles.
    pub fn next_scan_angles(&self, cycle: u64) -> (f64, f64) {
        let phase = self.phase_at(cycle);
        let pan = self.pan_from_phase(phase);
        (pan, self.tilt_for_pan(pan))
    }

    #[cfg(test)]
    pub fn direction_at(&self, cycle: u64) -> ScanDirection {
        if self.phase_at(cycle) < self.pan.span() {
            ScanDirection::Ascending
        } else {
            ScanDirection::Descending
        }
    }

    /// Re-anchor the sweep so `next_scan_angles(cycle)` is one step away from
    /// the current pan angle. The sweep heads toward the farther pan limit.
    pub fn resume_from(&mut self, angles: (f64, f64), cycle: u64) {
        let pan = self.pan.clamp(angles.0);
        let direction = if self.pan.max - pan >= pan - self.pan.min {
            ScanDirection::Ascending
        } else {
            ScanDirection::Descending
        };

        self.anchor_cycle = cycle;
        self.anchor_phase = self.wrap(self.phase_of(pan, direction) + self.step);

        debug!(
            "Scan resumes at pan {:.1} heading {:?} (cycle {})",
            pan, direction, cycle
        );
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    fn period(&self) -> f64 {
        2.0 * self.pan.span()
    }

    fn wrap(&self, phase: f64) -> f64 {
        let period = self.period();
        if period <= 0.0 {
            0.0
        } else {
            phase.rem_euclid(period)
        }
    }

    fn phase_at(&self, cycle: u64) -> f64 {
        let elapsed = cycle as f64 - self.anchor_cycle as f64;
        self.wrap(self.anchor_phase + elapsed * self.step)
    }

    fn phase_of(&self, pan: f64, direction: ScanDirection) -> f64 {
        let pan = self.pan.clamp(pan);
        match direction {
            ScanDirection::Ascending => pan - self.pan.min,
            ScanDirection::Descending => self.pan.span() + (self.pan.max - pan),
        }
    }

    fn pan_from_phase(&self, phase: f64) -> f64 {
        let span = self.pan.span();
        let pan = if phase <= span {
            self.pan.min + phase
        } else {
            self.pan.max - (phase - span)
        };
        self.pan.clamp(pan)
    }

    fn tilt_for_pan(&self, pan: f64) -> f64 {
        let half_span = self.pan.span() / 2.0;
        if half_span <= 0.0 {
            return self.tilt.clamp(self.tilt.center);
        }
        let offset = (pan - self.pan.center) / half_span;
        let tilt = self.tilt.center + self.tilt_amplitude * (PI * self.tilt_waves * offset).sin();
        self.tilt.clamp(tilt)
    }
}
