use super::state::{ModeTransition, TrackedTarget, TrackerMode};
use crate::config::TrackerConfig;
use crate::detection::Detection;
use crate::frame::normalize_point;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Three-state target tracker.
///
/// SEARCHING -> TRACKING on any detection. TRACKING -> REACQUIRING after
/// `miss_threshold` consecutive misses, REACQUIRING -> SEARCHING after
/// `reacquire_misses` further misses, REACQUIRING -> TRACKING on a fresh
/// detection. The target center is exponentially smoothed while tracking and
/// the smoothing restarts from the raw measurement on every (re)acquisition.
pub struct TargetTracker {
    mode: TrackerMode,
    target: Option<TrackedTarget>,
    consecutive_misses: u32,
    alpha: f64,
    miss_threshold: u32,
    reacquire_misses: u32,
    history: VecDeque<(u64, (f64, f64))>,
    history_len: usize,
}

impl TargetTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            mode: TrackerMode::Searching,
            target: None,
            consecutive_misses: 0,
            alpha: config.smoothing_alpha.clamp(f64::EPSILON, 1.0),
            miss_threshold: config.miss_threshold.max(1),
            reacquire_misses: config.reacquire_misses.max(1),
            history: VecDeque::with_capacity(config.history_len),
            history_len: config.history_len,
        }
    }

    /// Feed one cycle's fused detection (or its absence) into the tracker.
    ///
    /// `frame_size` is used to normalize the detection's center. Returns the
    /// mode transition, if this update caused one.
    pub fn update(
        &mut self,
        detection: Option<&Detection>,
        frame_size: (u32, u32),
        cycle: u64,
    ) -> Option<ModeTransition> {
        let previous = self.mode;

        match detection {
            Some(detection) => self.observe(detection, frame_size, cycle),
            None => self.miss(cycle),
        }

        if self.mode != previous {
            let transition = ModeTransition {
                from: previous,
                to: self.mode,
                cycle,
            };
            info!(
                "Tracker mode {} -> {} at cycle {}",
                transition.from, transition.to, cycle
            );
            Some(transition)
        } else {
            None
        }
    }

    fn observe(&mut self, detection: &Detection, frame_size: (u32, u32), cycle: u64) {
        let (px, py) = detection.bbox.center();
        let measured = normalize_point(px as f64, py as f64, frame_size.0, frame_size.1);

        let target = match (self.mode, self.target) {
            (TrackerMode::Tracking, Some(previous)) => {
                let center = (
                    self.alpha * measured.0 + (1.0 - self.alpha) * previous.center.0,
                    self.alpha * measured.1 + (1.0 - self.alpha) * previous.center.1,
                );
                TrackedTarget {
                    center,
                    confidence: detection.confidence,
                    class: detection.class,
                    age: previous.age.saturating_add(1),
                    last_seen: cycle,
                    last_box: detection.bbox,
                }
            }
            _ => {
                // Fresh acquisition: no blending with the pre-loss position
                self.history.clear();
                TrackedTarget {
                    center: measured,
                    confidence: detection.confidence,
                    class: detection.class,
                    age: 1,
                    last_seen: cycle,
                    last_box: detection.bbox,
                }
            }
        };

        debug!(
            "Cycle {}: {} target at ({:.3}, {:.3}) smoothed ({:.3}, {:.3})",
            cycle,
            detection.class.as_str(),
            measured.0,
            measured.1,
            target.center.0,
            target.center.1
        );

        self.push_history(cycle, target.center);
        self.target = Some(target);
        self.consecutive_misses = 0;
        self.mode = TrackerMode::Tracking;
    }

    fn miss(&mut self, cycle: u64) {
        if self.mode == TrackerMode::Searching {
            return;
        }

        self.consecutive_misses = self.consecutive_misses.saturating_add(1);
        if let Some(target) = self.target.as_mut() {
            target.age = 0;
        }

        match self.mode {
            TrackerMode::Tracking if self.consecutive_misses >= self.miss_threshold => {
                self.mode = TrackerMode::Reacquiring;
            }
            TrackerMode::Reacquiring
                if self.consecutive_misses >= self.miss_threshold + self.reacquire_misses =>
            {
                debug!(
                    "Cycle {}: target discarded after {} misses",
                    cycle, self.consecutive_misses
                );
                self.mode = TrackerMode::Searching;
                self.target = None;
                self.consecutive_misses = 0;
                self.history.clear();
            }
            _ => {}
        }
    }

    fn push_history(&mut self, cycle: u64, center: (f64, f64)) {
        if self.history_len == 0 {
            return;
        }
        while self.history.len() >= self.history_len {
            self.history.pop_front();
        }
        self.history.push_back((cycle, center));
    }

    pub fn mode(&self) -> TrackerMode {
        self.mode
    }

    pub fn target(&self) -> Option<&TrackedTarget> {
        self.target.as_ref()
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.consecutive_misses
    }

    /// Smoothed centers of the current acquisition, oldest first
    pub fn history(&self) -> impl Iterator<Item = &(u64, (f64, f64))> {
        self.history.iter()
    }
}
