use super::*;
use crate::camera::{FrameSource, SyntheticFrameSource};
use crate::config::TrackcamConfig;
use crate::error::{CameraError, Result};
use crate::frame::FrameData;
use crate::servo::LogServoDriver;
use std::time::Duration;

fn create_test_config() -> TrackcamConfig {
    let mut config = TrackcamConfig::default();
    config.camera.resolution = (80, 60);
    config.camera.fps = 50;
    config.camera.synthetic = true;
    config.camera.max_consecutive_failures = 3;
    config.servo.driver = "log".to_string();
    config.stream.overlay = false;
    config
}

fn no_stream() -> OrchestratorOptions {
    OrchestratorOptions {
        force_log_servo: true,
        enable_stream: false,
    }
}

fn orchestrator_with(source: Box<dyn FrameSource>) -> TrackcamOrchestrator {
    let config = create_test_config();
    let fusion = build_detection_fusion(&config.detection);
    TrackcamOrchestrator::with_components(
        config,
        no_stream(),
        source,
        fusion,
        Box::new(LogServoDriver::new()),
    )
}

struct DeadCamera;

impl FrameSource for DeadCamera {
    fn capture(&mut self) -> Result<FrameData> {
        Err(CameraError::NoFrame {
            details: "unplugged".to_string(),
        }
        .into())
    }

    fn resolution(&self) -> (u32, u32) {
        (80, 60)
    }
}

#[tokio::test]
async fn test_orchestrator_creation_with_synthetic_camera() {
    let orchestrator = TrackcamOrchestrator::new(create_test_config(), no_stream())
        .await
        .unwrap();

    let states = orchestrator.get_all_component_states().await;
    assert!(states.is_empty());
    assert_eq!(orchestrator.exchange().latest_sequence(), 0);
}

#[tokio::test]
async fn test_component_state_management() {
    let orchestrator = orchestrator_with(Box::new(SyntheticFrameSource::new(
        &create_test_config().camera,
    )));

    orchestrator
        .set_component_state("tracking", ComponentState::Starting)
        .await;
    assert_eq!(
        orchestrator.get_component_state("tracking").await,
        Some(ComponentState::Starting)
    );
    assert_eq!(orchestrator.get_component_state("missing").await, None);
}

#[tokio::test]
async fn test_start_publishes_and_shutdown_stops_cleanly() {
    let mut orchestrator = orchestrator_with(Box::new(SyntheticFrameSource::new(
        &create_test_config().camera,
    )));

    orchestrator.initialize().await.unwrap();
    assert_eq!(
        orchestrator.get_component_state("tracking").await,
        Some(ComponentState::Stopped)
    );

    orchestrator.start().await.unwrap();
    assert_eq!(
        orchestrator.get_component_state("tracking").await,
        Some(ComponentState::Running)
    );

    let exchange = orchestrator.exchange();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while exchange.latest_sequence() == 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(exchange.latest_sequence() > 0);

    let exit_code = orchestrator.shutdown().await.unwrap();
    assert_eq!(exit_code, 0);
    assert_eq!(
        orchestrator.get_component_state("tracking").await,
        Some(ComponentState::Stopped)
    );
}

#[tokio::test]
async fn test_lost_camera_ends_run_with_failure() {
    let mut orchestrator = orchestrator_with(Box::new(DeadCamera));
    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    let exit_code = tokio::time::timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exit_code, 1);
    assert_eq!(
        orchestrator.get_component_state("tracking").await,
        Some(ComponentState::Failed)
    );
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let mut orchestrator = orchestrator_with(Box::new(SyntheticFrameSource::new(
        &create_test_config().camera,
    )));
    orchestrator.start().await.unwrap();
    assert!(orchestrator.start().await.is_err());
    orchestrator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_dry_run_parks_without_running() {
    let mut orchestrator = orchestrator_with(Box::new(SyntheticFrameSource::new(
        &create_test_config().camera,
    )));
    let summary = orchestrator.dry_run().await.unwrap();
    assert_eq!(summary.cycles, 0);
    assert_eq!(summary.final_angles, (90.0, 90.0));
    assert_eq!(orchestrator.exchange().latest_sequence(), 0);
}
