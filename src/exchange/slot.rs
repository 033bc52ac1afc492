use super::envelope::FrameEnvelope;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Single-slot hand-off of the latest [`FrameEnvelope`].
///
/// The slot holds at most one envelope. A publish replaces it wholesale, so
/// readers see either the previous or the new envelope, never a mix. Both
/// sides only hold the lock long enough to swap or clone an `Arc`.
pub struct FrameExchange {
    latest: RwLock<Option<Arc<FrameEnvelope>>>,
    next_sequence: AtomicU64,
    stats: ExchangeStats,
}

/// Counters for exchange traffic
#[derive(Debug, Default)]
pub struct ExchangeStats {
    pub publishes: AtomicU64,
    pub reads: AtomicU64,
    pub empty_reads: AtomicU64,
    pub bytes_published: AtomicU64,
}

impl ExchangeStats {
    pub fn snapshot(&self) -> ExchangeStatsSnapshot {
        ExchangeStatsSnapshot {
            publishes: self.publishes.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            empty_reads: self.empty_reads.load(Ordering::Relaxed),
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExchangeStatsSnapshot {
    pub publishes: u64,
    pub reads: u64,
    pub empty_reads: u64,
    pub bytes_published: u64,
}

impl FrameExchange {
    pub fn new() -> Self {
        Self {
            latest: RwLock::new(None),
            next_sequence: AtomicU64::new(1),
            stats: ExchangeStats::default(),
        }
    }

    /// Stamp the envelope with the next sequence number and make it the latest.
    /// Returns the assigned sequence.
    pub fn publish(&self, mut envelope: FrameEnvelope) -> u64 {
        let bytes = envelope.jpeg.len() as u64;

        // Sequence is taken under the write lock so the slot never goes backwards
        let mut slot = self.latest.write();
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        envelope.sequence = sequence;
        *slot = Some(Arc::new(envelope));
        drop(slot);

        self.stats.publishes.fetch_add(1, Ordering::Relaxed);
        self.stats.bytes_published.fetch_add(bytes, Ordering::Relaxed);
        trace!("Published envelope {} ({} bytes)", sequence, bytes);
        sequence
    }

    /// Latest published envelope, or `None` before the first publish
    pub fn read_latest(&self) -> Option<Arc<FrameEnvelope>> {
        let latest = self.latest.read().clone();
        if latest.is_some() {
            self.stats.reads.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.empty_reads.fetch_add(1, Ordering::Relaxed);
        }
        latest
    }

    /// Latest envelope only if it is newer than `after`
    pub fn read_newer(&self, after: u64) -> Option<Arc<FrameEnvelope>> {
        self.read_latest()
            .filter(|envelope| envelope.sequence > after)
    }

    /// Sequence of the latest envelope, 0 before the first publish
    pub fn latest_sequence(&self) -> u64 {
        self.latest
            .read()
            .as_ref()
            .map(|envelope| envelope.sequence)
            .unwrap_or(0)
    }

    pub fn stats(&self) -> ExchangeStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for FrameExchange {
    fn default() -> Self {
        Self::new()
    }
}
