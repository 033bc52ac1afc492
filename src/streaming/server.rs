use crate::{
    config::StreamConfig,
    error::{Result, StreamError},
    exchange::FrameExchange,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::handlers::{
    health_handler, mjpeg_stream_handler, ping_handler, status_handler, stream_page_handler,
};
use super::stats::StreamStats;

/// Shared state for the Axum server
#[derive(Clone)]
pub struct ServerState {
    pub(crate) exchange: Arc<FrameExchange>,
    pub(crate) poll_interval: Duration,
    pub(crate) stats: Arc<StreamStats>,
}

impl ServerState {
    pub fn new(exchange: Arc<FrameExchange>, poll_interval: Duration) -> Self {
        Self {
            exchange,
            poll_interval,
            stats: Arc::new(StreamStats::default()),
        }
    }
}

/// All routes of the presentation layer
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(stream_page_handler))
        .route("/stream.mjpg", get(mjpeg_stream_handler))
        .route("/video_feed", get(mjpeg_stream_handler))
        .route("/api/status", get(status_handler))
        .route("/api/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// MJPEG and status server reading from the frame exchange
pub struct StreamServer {
    pub(crate) config: StreamConfig,
    pub(crate) exchange: Arc<FrameExchange>,
    pub(crate) poll_interval: Duration,
}

impl StreamServer {
    pub fn new(config: StreamConfig, exchange: Arc<FrameExchange>, target_fps: u32) -> Self {
        // Poll twice per publish interval so viewers lag by at most half a frame
        let poll_interval = Duration::from_micros(500_000u64 / target_fps.max(1) as u64);

        Self {
            config,
            exchange,
            poll_interval,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.ip, self.config.port)
    }

    /// Bind the listener. Kept separate from serving so bind failures surface
    /// during startup.
    pub async fn bind(&self) -> Result<tokio::net::TcpListener> {
        let addr = self.address();
        let listener =
            tokio::net::TcpListener::bind(&addr)
                .await
                .map_err(|e| StreamError::BindFailed {
                    address: addr.clone(),
                    source: e,
                })?;

        info!("Stream server listening on http://{}", addr);
        Ok(listener)
    }

    /// Serve until the token is cancelled
    pub async fn serve(
        &self,
        listener: tokio::net::TcpListener,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let app = router(ServerState::new(
            Arc::clone(&self.exchange),
            self.poll_interval,
        ));

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(|e| StreamError::StartupFailed {
                details: format!("Server error: {}", e),
            })?;

        info!("Stream server stopped");
        Ok(())
    }
}
