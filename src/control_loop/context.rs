use super::fps::FpsEstimator;
use crate::config::TrackcamConfig;
use crate::control::{ActuatorState, ProportionalController, ScanPattern};
use crate::detection::Detection;
use crate::tracking::{ModeTransition, TargetTracker, TrackerMode};
use tracing::trace;

/// Which control law produced a cycle's angles
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleCommand {
    /// Proportional correction toward a fresh detection
    Track((f64, f64)),
    /// Actuator frozen at its last angles
    Hold((f64, f64)),
    /// Next point of the autonomous sweep
    Scan((f64, f64)),
}

impl AngleCommand {
    pub fn angles(&self) -> (f64, f64) {
        match *self {
            AngleCommand::Track(a) | AngleCommand::Hold(a) | AngleCommand::Scan(a) => a,
        }
    }
}

/// All state owned by the control loop.
///
/// Nothing in here is shared with the presentation layer; the loop only
/// hands out copies through the published status.
pub struct ControlContext {
    tracker: TargetTracker,
    actuator: ActuatorState,
    controller: ProportionalController,
    scan: ScanPattern,
    fps: FpsEstimator,
    cycle: u64,
    consecutive_failures: u32,
    max_consecutive_failures: u32,
    scan_anchored: bool,
}

impl ControlContext {
    pub fn new(config: &TrackcamConfig) -> Self {
        Self {
            tracker: TargetTracker::new(&config.tracker),
            actuator: ActuatorState::from_config(&config.servo),
            controller: ProportionalController::from_config(&config.servo),
            scan: ScanPattern::from_config(&config.servo, &config.scan),
            fps: FpsEstimator::default(),
            cycle: 0,
            consecutive_failures: 0,
            max_consecutive_failures: config.camera.max_consecutive_failures,
            scan_anchored: false,
        }
    }

    /// Advance the tracker with this cycle's detection and pick the next
    /// angles. The actuator itself is only updated by [`commit`](Self::commit).
    pub fn decide(
        &mut self,
        detection: Option<&Detection>,
        frame_size: (u32, u32),
    ) -> (AngleCommand, Option<ModeTransition>) {
        let transition = self.tracker.update(detection, frame_size, self.cycle);
        if let Some(t) = transition {
            if t.to == TrackerMode::Searching {
                self.scan_anchored = false;
            }
        }

        let command = match self.tracker.mode() {
            TrackerMode::Tracking => match (detection, self.tracker.target()) {
                (Some(_), Some(target)) => AngleCommand::Track(
                    self.controller
                        .compute_command(target.center, &self.actuator)
                        .angles(),
                ),
                // A miss while still tracking holds position
                _ => AngleCommand::Hold(self.actuator.angles()),
            },
            TrackerMode::Reacquiring => AngleCommand::Hold(self.actuator.angles()),
            TrackerMode::Searching => {
                if !self.scan_anchored {
                    self.scan.resume_from(self.actuator.angles(), self.cycle);
                    self.scan_anchored = true;
                }
                let (pan, tilt) = self.scan.next_scan_angles(self.cycle);
                AngleCommand::Scan(self.actuator.step_toward(pan, tilt).angles())
            }
        };

        trace!("Cycle {}: {:?}", self.cycle, command);
        (command, transition)
    }

    /// Accept angles the driver confirmed writing
    pub fn commit(&mut self, angles: (f64, f64)) {
        self.actuator = self.actuator.step_toward(angles.0, angles.1);
    }

    /// Park position used at shutdown
    pub fn park(&mut self) -> (f64, f64) {
        self.actuator = self.actuator.centered();
        self.actuator.angles()
    }

    /// Close out a completed cycle
    pub fn finish_cycle(&mut self, elapsed: std::time::Duration) -> f64 {
        self.consecutive_failures = 0;
        self.cycle += 1;
        self.fps.record(elapsed)
    }

    /// Count a failed capture; true once the failure budget is exhausted
    pub fn record_capture_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures > self.max_consecutive_failures
    }

    pub fn tracker(&self) -> &TargetTracker {
        &self.tracker
    }

    pub fn mode(&self) -> TrackerMode {
        self.tracker.mode()
    }

    pub fn actuator(&self) -> &ActuatorState {
        &self.actuator
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn fps(&self) -> f64 {
        self.fps.fps()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
