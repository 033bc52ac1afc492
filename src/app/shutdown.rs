use super::{ComponentState, TrackcamOrchestrator};
use crate::error::{Result, TrackcamError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info};

const TRACKING_STOP_TIMEOUT: Duration = Duration::from_secs(10);
const STREAMING_STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl TrackcamOrchestrator {
    /// Stop all components. The tracking loop parks the actuator on its way out.
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        self.cancellation_token.cancel();

        let mut exit_code = 0;

        // Tracking first so the rig is parked even if the server hangs
        if let Err(e) = self.stop_tracking().await {
            error!("Error stopping tracking: {}", e);
            exit_code = 1;
        }

        if let Err(e) = self.stop_streaming().await {
            error!("Error stopping streaming: {}", e);
            exit_code = 1;
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    async fn stop_tracking(&mut self) -> Result<()> {
        let component = "tracking";
        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        let outcome = match (self.loop_outcome.take(), self.loop_handle.take()) {
            (Some(outcome), _) => outcome,
            (None, Some(handle)) => join_with_timeout(component, handle, TRACKING_STOP_TIMEOUT)
                .await
                .and_then(|inner| inner),
            (None, None) => {
                // Never started; park directly if the loop is still here
                if let Some(mut tracking_loop) = self.tracking_loop.take() {
                    tracking_loop.shutdown();
                }
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                return Ok(());
            }
        };

        match outcome {
            Ok(summary) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!(
                    "{} component stopped after {} cycles",
                    component, summary.cycles
                );
                Ok(())
            }
            Err(e) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("Error stopping {} component: {}", component, e);
                Err(e)
            }
        }
    }

    async fn stop_streaming(&mut self) -> Result<()> {
        let component = "streaming";
        let Some(handle) = self.stream_handle.take() else {
            return Ok(());
        };

        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        match join_with_timeout(component, handle, STREAMING_STOP_TIMEOUT)
            .await
            .and_then(|inner| inner)
        {
            Ok(()) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
                Ok(())
            }
            Err(e) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("Error stopping {} component: {}", component, e);
                Err(e)
            }
        }
    }
}

/// Await a component task, turning a timeout or panic into an error
async fn join_with_timeout<T>(
    component: &str,
    handle: JoinHandle<T>,
    limit: Duration,
) -> Result<T> {
    match timeout(limit, handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(TrackcamError::System {
            message: format!("{} component task failed: {}", component, e),
        }),
        Err(_) => {
            error!("{} component stop timeout", component);
            Err(TrackcamError::System {
                message: format!("{} component stop timeout", component),
            })
        }
    }
}
