use super::*;
use crate::detection::DetectorUsed;
use crate::tracking::TrackerMode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn envelope(tag: u8, pan: f64) -> FrameEnvelope {
    let status = StatusSnapshot {
        mode: TrackerMode::Tracking,
        target_present: true,
        pan_angle: pan,
        tilt_angle: 90.0,
        fps_estimate: 15.0,
        detector_used: DetectorUsed::Face,
        ..StatusSnapshot::default()
    };
    FrameEnvelope::new(vec![tag; 64], 8, 8, status)
}

#[test]
fn test_empty_exchange() {
    let exchange = FrameExchange::new();
    assert!(exchange.read_latest().is_none());
    assert_eq!(exchange.latest_sequence(), 0);
    assert_eq!(exchange.stats().empty_reads, 1);
}

#[test]
fn test_read_is_idempotent_without_publish() {
    let exchange = FrameExchange::new();
    exchange.publish(envelope(1, 80.0));

    let first = exchange.read_latest().unwrap();
    for _ in 0..100 {
        let again = exchange.read_latest().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.sequence, first.sequence);
    }
    assert_eq!(exchange.stats().reads, 101);
}

#[test]
fn test_cloned_jpeg_shares_the_published_buffer() {
    let exchange = FrameExchange::new();
    exchange.publish(envelope(7, 80.0));

    let latest = exchange.read_latest().unwrap();
    let viewer_a = latest.jpeg.clone();
    let viewer_b = exchange.read_latest().unwrap().jpeg.clone();
    assert_eq!(viewer_a.as_ptr(), viewer_b.as_ptr());
    assert_eq!(viewer_a.len(), 64);
}

#[test]
fn test_publish_supersedes_and_sequences_increase() {
    let exchange = FrameExchange::new();
    let mut last = 0;
    for tag in 0..10u8 {
        let sequence = exchange.publish(envelope(tag, tag as f64));
        assert!(sequence > last);
        last = sequence;

        let latest = exchange.read_latest().unwrap();
        assert_eq!(latest.sequence, sequence);
        assert_eq!(latest.jpeg[0], tag);
        assert_eq!(latest.status.pan_angle, tag as f64);
    }
    assert_eq!(exchange.stats().publishes, 10);
    assert_eq!(exchange.stats().bytes_published, 640);
}

#[test]
fn test_read_newer_cursor() {
    let exchange = FrameExchange::new();
    let first = exchange.publish(envelope(1, 1.0));
    assert_eq!(exchange.read_newer(0).unwrap().sequence, first);
    assert!(exchange.read_newer(first).is_none());

    // A slow reader skips straight to the latest
    exchange.publish(envelope(2, 2.0));
    let third = exchange.publish(envelope(3, 3.0));
    assert_eq!(exchange.read_newer(first).unwrap().sequence, third);
}

#[test]
fn test_concurrent_readers_see_consistent_monotonic_envelopes() {
    let exchange = Arc::new(FrameExchange::new());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let exchange = Arc::clone(&exchange);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut last = 0;
                while !done.load(Ordering::Relaxed) {
                    if let Some(latest) = exchange.read_latest() {
                        assert!(latest.sequence >= last);
                        // Frame bytes and status were published together
                        let tag = latest.jpeg[0];
                        assert!(latest.jpeg.iter().all(|b| *b == tag));
                        assert_eq!(latest.status.pan_angle, tag as f64);
                        last = latest.sequence;
                    }
                }
            })
        })
        .collect();

    for i in 0..2000u32 {
        let tag = (i % 251) as u8;
        exchange.publish(envelope(tag, tag as f64));
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(exchange.latest_sequence(), 2000);
}

#[test]
fn test_status_snapshot_serializes_mode_label() {
    let json = serde_json::to_value(StatusSnapshot::default()).unwrap();
    assert_eq!(json["mode"], "SEARCHING");
    assert_eq!(json["target_present"], false);
    assert_eq!(json["detector_used"], "none");
}
