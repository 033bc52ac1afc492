use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Viewer-side counters shared by every stream handler
#[derive(Debug, Default)]
pub struct StreamStats {
    active_viewers: AtomicU64,
    total_viewers: AtomicU64,
    frames_streamed: AtomicU64,
    bytes_streamed: AtomicU64,
}

impl StreamStats {
    /// Register a viewer; the guard unregisters it when the stream is dropped
    pub fn connect(self: &Arc<Self>) -> ViewerGuard {
        self.active_viewers.fetch_add(1, Ordering::Relaxed);
        self.total_viewers.fetch_add(1, Ordering::Relaxed);
        ViewerGuard {
            stats: Arc::clone(self),
        }
    }

    pub fn record_frame(&self, bytes: usize) {
        self.frames_streamed.fetch_add(1, Ordering::Relaxed);
        self.bytes_streamed.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StreamStatsSnapshot {
        StreamStatsSnapshot {
            active_viewers: self.active_viewers.load(Ordering::Relaxed),
            total_viewers: self.total_viewers.load(Ordering::Relaxed),
            frames_streamed: self.frames_streamed.load(Ordering::Relaxed),
            bytes_streamed: self.bytes_streamed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamStatsSnapshot {
    pub active_viewers: u64,
    pub total_viewers: u64,
    pub frames_streamed: u64,
    pub bytes_streamed: u64,
}

pub struct ViewerGuard {
    stats: Arc<StreamStats>,
}

impl Drop for ViewerGuard {
    fn drop(&mut self) {
        self.stats.active_viewers.fetch_sub(1, Ordering::Relaxed);
    }
}
