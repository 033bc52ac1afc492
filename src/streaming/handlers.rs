use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use bytes::Bytes;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use super::server::ServerState;

/// Multipart MJPEG stream, one part per newly published envelope.
///
/// Each viewer keeps its own sequence cursor. A new viewer starts at the
/// latest envelope; a slow viewer skips whatever was superseded meanwhile.
pub async fn mjpeg_stream_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let viewer = state.stats.connect();
    info!(
        "Stream viewer connected ({} active)",
        state.stats.snapshot().active_viewers
    );

    let stream = async_stream::stream! {
        let _viewer = viewer;
        let mut last_sequence = 0u64;
        let mut poll = interval(state.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            poll.tick().await;

            let Some(envelope) = state.exchange.read_newer(last_sequence) else {
                trace!("No new envelope after {}", last_sequence);
                continue;
            };
            if last_sequence != 0 && envelope.sequence > last_sequence + 1 {
                trace!(
                    "Viewer skipped {} envelopes",
                    envelope.sequence - last_sequence - 1
                );
            }
            last_sequence = envelope.sequence;

            let part_header = format!(
                "--FRAME\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nX-Sequence: {}\r\nX-Mode: {}\r\n\r\n",
                envelope.jpeg.len(),
                envelope.sequence,
                envelope.status.mode
            );
            state.stats.record_frame(envelope.jpeg.len());

            yield Ok::<_, axum::Error>(Bytes::from(part_header));
            yield Ok(envelope.jpeg.clone());
            yield Ok(Bytes::from_static(b"\r\n"));
        }
    };

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "multipart/x-mixed-replace; boundary=FRAME",
            ),
            (header::CACHE_CONTROL, "no-cache, private"),
            (header::PRAGMA, "no-cache"),
        ],
        Body::from_stream(stream),
    )
}

/// Latest status snapshot with its sequence number
pub async fn status_handler(State(state): State<ServerState>) -> impl IntoResponse {
    match state.exchange.read_latest() {
        Some(envelope) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "sequence": envelope.sequence,
                "status": &envelope.status,
            })),
        ),
        None => {
            debug!("Status requested before first publish");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "sequence": 0,
                    "status": null,
                    "error": "no frame published yet",
                })),
            )
        }
    }
}

pub async fn ping_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// Handler for health check endpoint
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let latest_sequence = state.exchange.latest_sequence();

    let health_info = serde_json::json!({
        "status": "healthy",
        "frames_available": latest_sequence > 0,
        "latest_sequence": latest_sequence,
        "exchange_stats": state.exchange.stats(),
        "stream_stats": state.stats.snapshot(),
    });

    (StatusCode::OK, Json(health_info))
}

/// Minimal viewer page with the live stream and a polled status line
pub async fn stream_page_handler() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Trackcam</title>
    <style>
        :root { color-scheme: dark; }
        body {
            margin: 0;
            background: #000;
            color: #ddd;
            font-family: monospace;
            display: flex;
            flex-direction: column;
            align-items: center;
            justify-content: center;
            min-height: 100vh;
        }
        img.stream {
            display: block;
            max-width: 100vw;
            max-height: 90vh;
            object-fit: contain;
        }
    </style>
</head>
<body>
    <img class="stream" src="/stream.mjpg" alt="Trackcam stream">
    <div id="status">waiting for status...</div>
    <script>
        async function refresh() {
            try {
                const res = await fetch('/api/status');
                const body = await res.json();
                const s = body.status;
                document.getElementById('status').textContent = s
                    ? `${s.mode} pan ${s.pan_angle.toFixed(1)} tilt ${s.tilt_angle.toFixed(1)} ${s.fps_estimate.toFixed(1)} fps (${s.detector_used})`
                    : 'no frame yet';
            } catch (e) {
                document.getElementById('status').textContent = 'status unavailable';
            }
        }
        setInterval(refresh, 1000);
        refresh();
    </script>
</body>
</html>
"#,
    )
}
