use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use super::hazard::HazardMap;

// ---------------------------------------------------------------------------
// Published telemetry snapshot
// ---------------------------------------------------------------------------

/// One complete inbound datagram as seen by the tick loop.
///
/// `sequence` and `received_at` are stamped locally by the receiver; the
/// wire protocol carries neither.
#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    pub hazard: HazardMap,
    pub sequence: u64,
    pub received_at: Instant,
}

impl TelemetrySnapshot {
    pub fn age(&self) -> std::time::Duration {
        self.received_at.elapsed()
    }
}

// ---------------------------------------------------------------------------
// Single-slot mailbox
// ---------------------------------------------------------------------------

/// Latest-value slot shared between the receiver and the tick loop.
///
/// Snapshots are immutable behind an `Arc`; publishing swaps the pointer, so
/// a reader holds either the old map and centroid or the new pair, never a
/// mix. The lock is held only for the pointer copy.
#[derive(Debug, Default)]
pub struct SnapshotMailbox {
    slot: Mutex<Option<Arc<TelemetrySnapshot>>>,
    published: AtomicU64,
}

impl SnapshotMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot with `hazard`. Returns the sequence
    /// number assigned to it (1 for the first publication).
    pub fn publish(&self, hazard: HazardMap) -> u64 {
        let sequence = self.published.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = Arc::new(TelemetrySnapshot {
            hazard,
            sequence,
            received_at: Instant::now(),
        });
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(snapshot);
        sequence
    }

    /// Current snapshot, or `None` if nothing has been published yet.
    pub fn latest(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
