use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use slicebus_frame::FrameError;

/// Running counters for one bus.
#[derive(Debug, Default)]
pub struct BusStats {
    frames_received: AtomicU64,
    frames_dispatched: AtomicU64,
    checksum_errors: AtomicU64,
    cport_errors: AtomicU64,
    malformed_frames: AtomicU64,
    data_queued: AtomicU64,
    control_queued: AtomicU64,
    messages_purged: AtomicU64,
}

/// Point-in-time copy of [`BusStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub frames_received: u64,
    pub frames_dispatched: u64,
    pub checksum_errors: u64,
    pub cport_errors: u64,
    pub malformed_frames: u64,
    pub data_queued: u64,
    pub control_queued: u64,
    pub messages_purged: u64,
}

impl BusStats {
    pub(crate) fn received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dispatched(&self) {
        self.frames_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dropped(&self, err: &FrameError) {
        let counter = match err {
            FrameError::ChecksumMismatch { .. } => &self.checksum_errors,
            FrameError::InvalidCport { .. } => &self.cport_errors,
            _ => &self.malformed_frames,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn data_queued(&self) {
        self.data_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn control_queued(&self) {
        self.control_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn purged(&self, count: usize) {
        self.messages_purged
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dispatched: self.frames_dispatched.load(Ordering::Relaxed),
            checksum_errors: self.checksum_errors.load(Ordering::Relaxed),
            cport_errors: self.cport_errors.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            data_queued: self.data_queued.load(Ordering::Relaxed),
            control_queued: self.control_queued.load(Ordering::Relaxed),
            messages_purged: self.messages_purged.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_are_counted_by_cause() {
        let stats = BusStats::default();
        stats.dropped(&FrameError::ChecksumMismatch { sum: 1 });
        stats.dropped(&FrameError::InvalidCport { cport: 9, max: 4 });
        stats.dropped(&FrameError::Truncated { len: 1 });
        stats.dropped(&FrameError::Truncated { len: 0 });

        let snap = stats.snapshot();
        assert_eq!(snap.checksum_errors, 1);
        assert_eq!(snap.cport_errors, 1);
        assert_eq!(snap.malformed_frames, 2);
    }

    #[test]
    fn snapshot_serializes_as_flat_object() {
        let stats = BusStats::default();
        stats.received();
        stats.purged(3);

        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["frames_received"], 1);
        assert_eq!(json["messages_purged"], 3);
    }
}
