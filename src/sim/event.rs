use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::dynamics::state::ContactEvent;
use super::flight::EpisodeOutcome;

// ---------------------------------------------------------------------------
// Contact queue
// ---------------------------------------------------------------------------

/// Contacts reported by the physics engine between ticks. Drained once per
/// tick, at a fixed point, so ordering never depends on callback timing.
#[derive(Debug, Clone, Default)]
pub struct ContactQueue {
    pending: VecDeque<ContactEvent>,
}

impl ContactQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, contact: ContactEvent) {
        self.pending.push_back(contact);
    }

    /// Remove and return every queued contact in arrival order.
    pub fn drain(&mut self) -> Vec<ContactEvent> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

// ---------------------------------------------------------------------------
// Episode events
// ---------------------------------------------------------------------------

/// Notable things that happened during an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Reset,
    /// A newer telemetry snapshot became visible to the tick loop.
    TelemetryAcquired { sequence: u64 },
    Contact { closing_speed: f64 },
    Terminal(EpisodeOutcome),
}

/// A discrete event with the tick it was observed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeEvent {
    pub tick: u64,
    pub kind: EventKind,
}
