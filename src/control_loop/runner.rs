use super::context::{AngleCommand, ControlContext};
use crate::camera::FrameSource;
use crate::config::TrackcamConfig;
use crate::detection::DetectionFusion;
use crate::error::{CameraError, Result, TrackcamError};
use crate::exchange::{FrameEnvelope, FrameExchange, StatusSnapshot};
use crate::overlay::{FrameAnnotator, OverlayInfo};
use crate::servo::ServoDriver;
use crate::tracking::{ModeTransition, TrackerMode};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Result of one pass through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Capture failed; nothing advanced and nothing was published
    Skipped { consecutive_failures: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub mode: TrackerMode,
    pub transition: Option<ModeTransition>,
    pub command: AngleCommand,
    /// Angles the actuator holds after this cycle
    pub angles: (f64, f64),
    pub servo_ok: bool,
    pub sequence: Option<u64>,
}

/// Totals reported when the loop exits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopSummary {
    pub cycles: u64,
    pub skipped: u64,
    pub servo_failures: u64,
    pub final_angles: (f64, f64),
}

/// The capture -> fuse -> track -> control -> actuate -> publish pipeline
pub struct TrackingLoop {
    context: ControlContext,
    source: Box<dyn FrameSource>,
    fusion: DetectionFusion,
    driver: Box<dyn ServoDriver>,
    annotator: FrameAnnotator,
    exchange: Arc<FrameExchange>,
    frame_interval: Duration,
    last_sent: Option<(f64, f64)>,
    last_started: Option<Instant>,
    summary: LoopSummary,
}

impl TrackingLoop {
    pub fn new(
        config: &TrackcamConfig,
        source: Box<dyn FrameSource>,
        fusion: DetectionFusion,
        driver: Box<dyn ServoDriver>,
        exchange: Arc<FrameExchange>,
    ) -> Self {
        let frame_interval = Duration::from_secs_f64(1.0 / config.camera.fps.max(1) as f64);
        Self {
            context: ControlContext::new(config),
            source,
            fusion,
            driver,
            annotator: FrameAnnotator::new(&config.stream),
            exchange,
            frame_interval,
            last_sent: None,
            last_started: None,
            summary: LoopSummary::default(),
        }
    }

    pub fn context(&self) -> &ControlContext {
        &self.context
    }

    /// Run a single cycle. Only a lost camera is returned as an error.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let started = Instant::now();

        let frame = match self.source.capture() {
            Ok(frame) => frame,
            Err(e) => return self.capture_failed(e),
        };
        let mut image = match frame.to_rgb_image() {
            Ok(image) => image,
            Err(e) => return self.capture_failed(e),
        };

        let cycle = self.context.cycle();
        let fused = self.fusion.fuse(&frame);
        let (command, transition) = self
            .context
            .decide(fused.detection.as_ref(), (frame.width, frame.height));

        let servo_ok = self.actuate(command.angles());
        let period = match self.last_started {
            Some(previous) => started.duration_since(previous),
            None => started.elapsed(),
        };
        self.last_started = Some(started);
        let fps = self.context.finish_cycle(period);

        let target = self.context.tracker().target().copied();
        let status = StatusSnapshot {
            mode: self.context.mode(),
            target_present: target.is_some(),
            pan_angle: self.context.actuator().pan(),
            tilt_angle: self.context.actuator().tilt(),
            fps_estimate: fps,
            detector_used: fused.detector_used,
            confidence: fused.detection.as_ref().map(|d| d.confidence),
            target_center: target.map(|t| t.center),
            cycle,
            updated_at: Utc::now(),
        };

        self.annotator.annotate(
            &mut image,
            &OverlayInfo {
                mode: status.mode,
                fps,
                detection_box: fused.detection.as_ref().map(|d| d.bbox),
                confidence: status.confidence,
                detector_used: status.detector_used,
                target_center: status.target_center,
                trail: self
                    .context
                    .tracker()
                    .history()
                    .map(|(_, center)| *center)
                    .collect(),
            },
        );

        let sequence = match self.annotator.encode(&image) {
            Ok(jpeg) => Some(self.exchange.publish(FrameEnvelope::new(
                jpeg,
                image.width(),
                image.height(),
                status,
            ))),
            Err(e) => {
                warn!("Cycle {}: frame not published: {}", cycle, e);
                None
            }
        };

        self.summary.cycles += 1;
        let report = CycleReport {
            cycle,
            mode: self.context.mode(),
            transition,
            command,
            angles: self.context.actuator().angles(),
            servo_ok,
            sequence,
        };
        trace!("Cycle report: {:?}", report);
        Ok(CycleOutcome::Completed(report))
    }

    fn capture_failed(&mut self, e: TrackcamError) -> Result<CycleOutcome> {
        self.summary.skipped += 1;
        let exhausted = self.context.record_capture_failure();
        let failures = self.context.consecutive_failures();

        if exhausted {
            error!("Camera lost after {} consecutive capture failures", failures);
            return Err(CameraError::Disconnected { failures }.into());
        }

        warn!("Capture failed ({} in a row): {}", failures, e);
        Ok(CycleOutcome::Skipped {
            consecutive_failures: failures,
        })
    }

    /// Send angles to the driver; the actuator only moves if the write succeeds
    fn actuate(&mut self, angles: (f64, f64)) -> bool {
        if self.last_sent == Some(angles) {
            return true;
        }

        match self.driver.set_angles(angles.0, angles.1) {
            Ok(()) => {
                self.context.commit(angles);
                self.last_sent = Some(angles);
                true
            }
            Err(e) => {
                self.summary.servo_failures += 1;
                self.last_sent = None;
                warn!(
                    "Servo command ({:.1}, {:.1}) failed on {}: {}",
                    angles.0,
                    angles.1,
                    self.driver.name(),
                    e
                );
                false
            }
        }
    }

    /// Run cycles until cancelled or the camera is lost, then park.
    /// Blocks the calling thread.
    pub fn run(mut self, token: CancellationToken) -> Result<LoopSummary> {
        info!(
            "Tracking loop started ({:.1} ms per cycle, servo driver: {})",
            self.frame_interval.as_secs_f64() * 1000.0,
            self.driver.name()
        );

        let mut outcome = Ok(());
        while !token.is_cancelled() {
            let started = Instant::now();
            match self.run_cycle() {
                Ok(_) => {}
                Err(e) if e.is_fatal() => {
                    outcome = Err(e);
                    break;
                }
                Err(e) => warn!("Cycle failed, continuing: {}", e),
            }

            let elapsed = started.elapsed();
            if elapsed < self.frame_interval {
                std::thread::sleep(self.frame_interval - elapsed);
            }
        }

        let summary = self.shutdown();
        outcome.map(|_| summary)
    }

    /// Spawn [`run`](Self::run) on the blocking pool
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<Result<LoopSummary>> {
        tokio::task::spawn_blocking(move || self.run(token))
    }

    /// Center the rig, release the servos and stop the camera
    pub fn shutdown(&mut self) -> LoopSummary {
        info!("Tracking loop stopping; parking actuator at center");

        let (pan, tilt) = self.context.park();
        if let Err(e) = self.driver.set_angles(pan, tilt) {
            warn!("Failed to park actuator: {}", e);
        }
        if let Err(e) = self.driver.release() {
            warn!("Failed to release servos: {}", e);
        }
        self.source.close();

        self.summary.final_angles = (pan, tilt);
        debug!("Loop summary: {:?}", self.summary);
        info!(
            "Tracking loop stopped after {} cycles ({} skipped)",
            self.summary.cycles, self.summary.skipped
        );
        self.summary.clone()
    }
}
