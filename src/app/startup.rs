use super::{ComponentState, TrackcamOrchestrator};
use crate::control_loop::LoopSummary;
use crate::error::{Result, TrackcamError};
use tracing::{error, info};

impl TrackcamOrchestrator {
    /// Register all components as stopped
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing trackcam components");

        let mut states = self.component_states.lock().await;
        states.insert("tracking".to_string(), ComponentState::Stopped);
        #[cfg(feature = "streaming")]
        if self.stream_server.is_some() {
            states.insert("streaming".to_string(), ComponentState::Stopped);
        }
        drop(states);

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start the stream server, then the tracking loop
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting trackcam");

        #[cfg(feature = "streaming")]
        if let Some(server) = self.stream_server.take() {
            self.set_component_state("streaming", ComponentState::Starting)
                .await;

            // Bind now so a busy port fails startup instead of a background task
            let listener = match server.bind().await {
                Ok(listener) => listener,
                Err(e) => {
                    self.set_component_state("streaming", ComponentState::Failed)
                        .await;
                    error!("Failed to start stream server: {}", e);
                    return Err(e);
                }
            };

            let token = self.cancellation_token.child_token();
            self.stream_handle = Some(tokio::spawn(async move {
                let result = server.serve(listener, token).await;
                if let Err(e) = &result {
                    error!("Stream server error: {}", e);
                }
                result
            }));

            self.set_component_state("streaming", ComponentState::Running)
                .await;
            info!(
                "Streaming server started on {}:{}",
                self.config.stream.ip, self.config.stream.port
            );
        }

        let tracking_loop = self
            .tracking_loop
            .take()
            .ok_or_else(|| TrackcamError::system("Tracking loop already started"))?;

        self.set_component_state("tracking", ComponentState::Starting)
            .await;
        self.loop_handle = Some(tracking_loop.spawn(self.cancellation_token.child_token()));
        self.set_component_state("tracking", ComponentState::Running)
            .await;

        info!("Trackcam started successfully");
        Ok(())
    }

    /// Initialize the hardware, park the actuator at center and stop
    pub async fn dry_run(&mut self) -> Result<LoopSummary> {
        let mut tracking_loop = self
            .tracking_loop
            .take()
            .ok_or_else(|| TrackcamError::system("Tracking loop already started"))?;

        info!("Dry run: centering actuator");
        let summary = tokio::task::spawn_blocking(move || tracking_loop.shutdown())
            .await
            .map_err(|e| TrackcamError::system(format!("Dry run task failed: {}", e)))?;

        self.set_component_state("tracking", ComponentState::Stopped)
            .await;
        Ok(summary)
    }
}
