use super::*;
use crate::camera::FrameSource;
use crate::config::TrackcamConfig;
use crate::detection::{
    BoundingBox, Detection, DetectionFusion, Detector, NullDetector, TargetClass,
};
use crate::error::{CameraError, DetectorError, Result, ServoError, TrackcamError};
use crate::exchange::FrameExchange;
use crate::frame::FrameData;
use crate::servo::ServoDriver;
use crate::tracking::TrackerMode;
use image::RgbImage;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

const WIDTH: u32 = 200;
const HEIGHT: u32 = 100;

fn test_config() -> TrackcamConfig {
    let mut config = TrackcamConfig::default();
    config.camera.resolution = (WIDTH, HEIGHT);
    config.camera.fps = 100;
    config.camera.max_consecutive_failures = 2;
    config.stream.overlay = false;
    config.servo.driver = "log".to_string();
    config
}

/// Blank frames forever, or scripted failures first
struct ScriptedSource {
    failures_first: u32,
    always_fail: bool,
    next_id: u64,
}

impl ScriptedSource {
    fn healthy() -> Self {
        Self {
            failures_first: 0,
            always_fail: false,
            next_id: 0,
        }
    }

    fn failing_first(count: u32) -> Self {
        Self {
            failures_first: count,
            ..Self::healthy()
        }
    }

    fn broken() -> Self {
        Self {
            always_fail: true,
            ..Self::healthy()
        }
    }
}

impl FrameSource for ScriptedSource {
    fn capture(&mut self) -> Result<FrameData> {
        if self.always_fail || self.failures_first > 0 {
            self.failures_first = self.failures_first.saturating_sub(1);
            return Err(CameraError::NoFrame {
                details: "scripted failure".to_string(),
            }
            .into());
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(FrameData::from_rgb_image(
            id,
            SystemTime::now(),
            RgbImage::new(WIDTH, HEIGHT),
        ))
    }

    fn resolution(&self) -> (u32, u32) {
        (WIDTH, HEIGHT)
    }
}

/// Face detector that replays one scripted result per call
struct ScriptedFace {
    script: VecDeque<Option<(f64, f64)>>,
}

impl Detector for ScriptedFace {
    fn class(&self) -> TargetClass {
        TargetClass::Face
    }

    fn name(&self) -> &str {
        "scripted-face"
    }

    fn infer(&mut self, _frame: &FrameData) -> std::result::Result<Vec<Detection>, DetectorError> {
        Ok(match self.script.pop_front().flatten() {
            Some((nx, ny)) => vec![face_at(nx, ny)],
            None => Vec::new(),
        })
    }
}

fn face_at(nx: f64, ny: f64) -> Detection {
    let cx = (nx + 1.0) * WIDTH as f64 / 2.0;
    let cy = (ny + 1.0) * HEIGHT as f64 / 2.0;
    Detection::new(
        BoundingBox::new(cx as f32 - 10.0, cy as f32 - 10.0, 20.0, 20.0),
        0.9,
        TargetClass::Face,
    )
}

#[derive(Default)]
struct DriverLog {
    commands: Vec<(f64, f64)>,
    released: bool,
}

struct RecordingDriver {
    log: Arc<Mutex<DriverLog>>,
    fail: bool,
}

impl ServoDriver for RecordingDriver {
    fn name(&self) -> &str {
        "recording"
    }

    fn set_angles(&mut self, pan: f64, tilt: f64) -> std::result::Result<(), ServoError> {
        if self.fail {
            return Err(ServoError::Write {
                details: "scripted failure".to_string(),
            });
        }
        self.log.lock().commands.push((pan, tilt));
        Ok(())
    }

    fn release(&mut self) -> std::result::Result<(), ServoError> {
        self.log.lock().released = true;
        Ok(())
    }
}

struct Harness {
    tracking: TrackingLoop,
    exchange: Arc<FrameExchange>,
    driver_log: Arc<Mutex<DriverLog>>,
}

fn harness(
    config: &TrackcamConfig,
    source: ScriptedSource,
    faces: Vec<Option<(f64, f64)>>,
    driver_fails: bool,
) -> Harness {
    let fusion = DetectionFusion::new(
        Box::new(ScriptedFace {
            script: faces.into(),
        }),
        Box::new(NullDetector::new(TargetClass::Body)),
        &config.detection,
    );
    let exchange = Arc::new(FrameExchange::new());
    let driver_log = Arc::new(Mutex::new(DriverLog::default()));
    let driver = RecordingDriver {
        log: Arc::clone(&driver_log),
        fail: driver_fails,
    };
    let tracking = TrackingLoop::new(
        config,
        Box::new(source),
        fusion,
        Box::new(driver),
        Arc::clone(&exchange),
    );
    Harness {
        tracking,
        exchange,
        driver_log,
    }
}

fn completed(outcome: CycleOutcome) -> CycleReport {
    match outcome {
        CycleOutcome::Completed(report) => report,
        other => panic!("expected a completed cycle, got {:?}", other),
    }
}

#[test]
fn test_no_target_scans_and_publishes_every_cycle() {
    let config = test_config();
    let mut h = harness(&config, ScriptedSource::healthy(), vec![], false);

    let mut previous = (90.0, 90.0);
    for expected_sequence in 1..=5 {
        let report = completed(h.tracking.run_cycle().unwrap());
        assert_eq!(report.mode, TrackerMode::Searching);
        assert!(matches!(report.command, AngleCommand::Scan(_)));
        assert!((report.angles.0 - previous.0).abs() <= config.servo.max_step_per_cycle);
        assert!((report.angles.1 - previous.1).abs() <= config.servo.max_step_per_cycle);
        assert_eq!(report.sequence, Some(expected_sequence));
        previous = report.angles;
    }

    let latest = h.exchange.read_latest().unwrap();
    assert_eq!(latest.sequence, 5);
    assert_eq!(latest.status.mode, TrackerMode::Searching);
    assert!(!latest.status.target_present);
    assert_eq!(latest.status.pan_angle, previous.0);
    assert_eq!(&latest.jpeg[..2], &[0xFF, 0xD8]);
    assert_eq!(h.driver_log.lock().commands.len(), 5);
}

#[test]
fn test_detection_drives_proportional_correction() {
    let config = test_config();
    let mut h = harness(
        &config,
        ScriptedSource::healthy(),
        vec![Some((0.5, 0.0)), Some((0.5, 0.0))],
        false,
    );

    let first = completed(h.tracking.run_cycle().unwrap());
    assert_eq!(first.mode, TrackerMode::Tracking);
    assert_eq!(first.transition.unwrap().from, TrackerMode::Searching);
    // kp_pan 7.5 * 0.5 = 3.75 degrees, under the 4 degree cap
    assert!(matches!(first.command, AngleCommand::Track(_)));
    assert!((first.angles.0 - 86.25).abs() < 1e-9);
    assert_eq!(first.angles.1, 90.0);

    let status = h.exchange.read_latest().unwrap().status.clone();
    assert!(status.target_present);
    assert_eq!(status.detector_used, crate::detection::DetectorUsed::Face);
    assert_eq!(status.confidence, Some(0.9));
}

#[test]
fn test_misses_hold_then_reacquire_then_scan() {
    let mut config = test_config();
    config.tracker.miss_threshold = 2;
    config.tracker.reacquire_misses = 1;
    let mut h = harness(&config, ScriptedSource::healthy(), vec![Some((0.5, 0.0))], false);

    let tracked = completed(h.tracking.run_cycle().unwrap());
    let held = tracked.angles;

    let miss = completed(h.tracking.run_cycle().unwrap());
    assert_eq!(miss.mode, TrackerMode::Tracking);
    assert_eq!(miss.command, AngleCommand::Hold(held));

    let reacquiring = completed(h.tracking.run_cycle().unwrap());
    assert_eq!(reacquiring.mode, TrackerMode::Reacquiring);
    assert_eq!(reacquiring.angles, held);

    let searching = completed(h.tracking.run_cycle().unwrap());
    assert_eq!(searching.mode, TrackerMode::Searching);
    assert!(matches!(searching.command, AngleCommand::Scan(_)));
    // Sweep picks up next to the held angle
    assert!((searching.angles.0 - held.0).abs() <= config.scan.step_degrees + 1e-9);
}

#[test]
fn test_capture_failures_are_skipped_cycles() {
    let config = test_config();
    let mut h = harness(&config, ScriptedSource::failing_first(2), vec![], false);

    assert_eq!(
        h.tracking.run_cycle().unwrap(),
        CycleOutcome::Skipped {
            consecutive_failures: 1
        }
    );
    assert_eq!(
        h.tracking.run_cycle().unwrap(),
        CycleOutcome::Skipped {
            consecutive_failures: 2
        }
    );
    assert_eq!(h.tracking.context().cycle(), 0);
    assert!(h.exchange.read_latest().is_none());
    assert!(h.driver_log.lock().commands.is_empty());

    let report = completed(h.tracking.run_cycle().unwrap());
    assert_eq!(report.cycle, 0);
    assert_eq!(h.tracking.context().consecutive_failures(), 0);
}

#[test]
fn test_camera_declared_lost_after_failure_budget() {
    let config = test_config();
    let mut h = harness(&config, ScriptedSource::broken(), vec![], false);

    assert!(h.tracking.run_cycle().is_ok());
    assert!(h.tracking.run_cycle().is_ok());
    match h.tracking.run_cycle() {
        Err(TrackcamError::Camera(CameraError::Disconnected { failures })) => {
            assert_eq!(failures, 3)
        }
        other => panic!("expected disconnect, got {:?}", other),
    }
}

#[test]
fn test_servo_failure_keeps_previous_angles() {
    let config = test_config();
    let mut h = harness(&config, ScriptedSource::healthy(), vec![Some((0.8, 0.8))], true);

    let report = completed(h.tracking.run_cycle().unwrap());
    assert!(!report.servo_ok);
    assert_eq!(report.angles, (90.0, 90.0));
    assert_eq!(h.tracking.context().actuator().angles(), (90.0, 90.0));
    // The cycle still publishes
    assert_eq!(report.sequence, Some(1));
}

#[test]
fn test_run_exits_on_disconnect_and_parks() {
    let config = test_config();
    let h = harness(&config, ScriptedSource::broken(), vec![], false);
    let log = Arc::clone(&h.driver_log);

    let result = h.tracking.run(CancellationToken::new());
    assert!(matches!(
        result,
        Err(TrackcamError::Camera(CameraError::Disconnected { .. }))
    ));

    let log = log.lock();
    assert_eq!(log.commands.last(), Some(&(90.0, 90.0)));
    assert!(log.released);
}

#[tokio::test]
async fn test_spawned_loop_stops_on_cancel_and_centers() {
    let config = test_config();
    let faces = vec![Some((0.9, 0.9)); 20];
    let h = harness(&config, ScriptedSource::healthy(), faces, false);
    let log = Arc::clone(&h.driver_log);
    let exchange = Arc::clone(&h.exchange);

    let token = CancellationToken::new();
    let handle = h.tracking.spawn(token.clone());
    tokio::time::sleep(Duration::from_millis(80)).await;
    token.cancel();

    let summary = handle.await.unwrap().unwrap();
    assert!(summary.cycles > 0);
    assert_eq!(summary.final_angles, (90.0, 90.0));
    assert!(exchange.latest_sequence() > 0);

    let log = log.lock();
    assert_eq!(log.commands.last(), Some(&(90.0, 90.0)));
    assert!(log.released);
}
