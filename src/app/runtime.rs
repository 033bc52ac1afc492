use super::{ShutdownReason, TrackcamOrchestrator};
use crate::error::{Result, TrackcamError};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info, warn};

impl TrackcamOrchestrator {
    /// Run until a signal arrives or the tracking loop exits, then shut down.
    /// Returns the process exit code.
    pub async fn run(&mut self) -> Result<i32> {
        info!("Trackcam is running");

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| TrackcamError::System {
                message: "Shutdown sender already taken".to_string(),
            })?;

        let shutdown_receiver =
            self.shutdown_receiver
                .take()
                .ok_or_else(|| TrackcamError::System {
                    message: "Shutdown receiver already taken".to_string(),
                })?;

        let mut loop_handle = self
            .loop_handle
            .take()
            .ok_or_else(|| TrackcamError::system("Tracking loop is not running"))?;

        self.setup_signal_handlers(shutdown_sender).await;

        let shutdown_reason = tokio::select! {
            reason = shutdown_receiver => reason.map_err(|_| TrackcamError::System {
                message: "Shutdown channel closed unexpectedly".to_string(),
            })?,
            joined = &mut loop_handle => {
                let outcome = joined.unwrap_or_else(|e| {
                    Err(TrackcamError::system(format!("Tracking loop panicked: {}", e)))
                });
                let reason = match &outcome {
                    Ok(_) => ShutdownReason::LoopExited,
                    Err(e) => {
                        error!("Tracking loop failed: {}", e);
                        ShutdownReason::Error(e.to_string())
                    }
                };
                self.loop_outcome = Some(outcome);
                reason
            }
        };

        if self.loop_outcome.is_none() {
            self.loop_handle = Some(loop_handle);
        }

        info!("Shutdown initiated: {:?}", shutdown_reason);

        let exit_code = self.shutdown().await?;

        info!("Trackcam shutdown complete");
        Ok(exit_code)
    }

    /// Set up signal handlers for graceful shutdown
    async fn setup_signal_handlers(&self, shutdown_sender: oneshot::Sender<ShutdownReason>) {
        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::spawn(async move {
                        if sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                                let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                            }
                        }
                    });
                }
                Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
            }
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }
}
