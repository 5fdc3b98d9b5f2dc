// src/pipeline/event_bus.rs
//
// Decoupled event system. The frame driver publishes ROI transitions
// here instead of reaching into the sinks directly.

use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "event")]
pub enum RoiEvent {
    TrackEnteredRoi {
        track_id: u64,
        timestamp: f64,
    },

    TrackExitedRoi {
        track_id: u64,
        timestamp: f64,
        was_alerting: bool,
    },

    AlertRaised {
        track_id: u64,
        timestamp: f64,
        dwell_seconds: f64,
    },

    AlertRetracted {
        track_id: u64,
        timestamp: f64,
    },

    /// Track dropped after not reporting for too long
    TrackEvicted {
        track_id: u64,
        timestamp: f64,
        was_alerting: bool,
    },
}

pub struct EventBus {
    events: VecDeque<RoiEvent>,
    max_pending: usize,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    pub fn publish(&mut self, event: RoiEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<RoiEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}
