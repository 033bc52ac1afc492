use super::types::{ComponentState, ShutdownReason};
use crate::camera::{open_frame_source, FrameSource};
use crate::config::{DetectionConfig, TrackcamConfig};
use crate::control_loop::{LoopSummary, TrackingLoop};
use crate::detection::{DetectionFusion, MotionDetector, NullDetector, TargetClass};
use crate::error::Result;
use crate::exchange::FrameExchange;
use crate::servo::{open_servo_driver, ServoDriver};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[cfg(feature = "streaming")]
use crate::streaming::StreamServer;

/// Runtime switches that come from the command line rather than the config
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Use the log-only servo driver regardless of config
    pub force_log_servo: bool,
    /// Serve the MJPEG stream and status API
    pub enable_stream: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            force_log_servo: false,
            enable_stream: cfg!(feature = "streaming"),
        }
    }
}

/// Face detection runs first; with no face model wired in the face slot is
/// empty and the motion detector fills the body slot.
pub fn build_detection_fusion(config: &DetectionConfig) -> DetectionFusion {
    DetectionFusion::new(
        Box::new(NullDetector::new(TargetClass::Face)),
        Box::new(MotionDetector::new(config)),
        config,
    )
}

/// Main application coordinator: owns the tracking loop and the stream server
pub struct TrackcamOrchestrator {
    pub(super) config: TrackcamConfig,
    pub(super) exchange: Arc<FrameExchange>,

    // Components
    pub(super) tracking_loop: Option<TrackingLoop>,
    #[cfg(feature = "streaming")]
    pub(super) stream_server: Option<StreamServer>,

    // Running tasks
    pub(super) loop_handle: Option<JoinHandle<Result<LoopSummary>>>,
    pub(super) loop_outcome: Option<Result<LoopSummary>>,
    pub(super) stream_handle: Option<JoinHandle<Result<()>>>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl TrackcamOrchestrator {
    /// Open the configured camera and servo driver and wire everything up
    pub async fn new(config: TrackcamConfig, options: OrchestratorOptions) -> Result<Self> {
        let source = open_frame_source(&config.camera)?;
        let driver = open_servo_driver(&config.servo, options.force_log_servo)?;
        let fusion = build_detection_fusion(&config.detection);

        Ok(Self::with_components(config, options, source, fusion, driver))
    }

    /// Wire up already constructed edge adapters
    pub fn with_components(
        config: TrackcamConfig,
        options: OrchestratorOptions,
        source: Box<dyn FrameSource>,
        fusion: DetectionFusion,
        driver: Box<dyn ServoDriver>,
    ) -> Self {
        let exchange = Arc::new(FrameExchange::new());
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let tracking_loop = TrackingLoop::new(
            &config,
            source,
            fusion,
            driver,
            Arc::clone(&exchange),
        );

        #[cfg(feature = "streaming")]
        let stream_server = options.enable_stream.then(|| {
            StreamServer::new(
                config.stream.clone(),
                Arc::clone(&exchange),
                config.camera.fps,
            )
        });

        #[cfg(not(feature = "streaming"))]
        if options.enable_stream {
            tracing::warn!("Built without streaming support; stream disabled");
        }

        info!(
            "Orchestrator ready (stream {})",
            if options.enable_stream { "enabled" } else { "disabled" }
        );

        Self {
            config,
            exchange,
            tracking_loop: Some(tracking_loop),
            #[cfg(feature = "streaming")]
            stream_server,
            loop_handle: None,
            loop_outcome: None,
            stream_handle: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Latest-frame slot shared with the presentation layer
    pub fn exchange(&self) -> Arc<FrameExchange> {
        Arc::clone(&self.exchange)
    }

    pub fn config(&self) -> &TrackcamConfig {
        &self.config
    }

    /// Token that stops every component when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }
}
