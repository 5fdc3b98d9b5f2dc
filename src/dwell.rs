// src/dwell.rs
//
// ROI dwell-time state machine. One monitor instance per stream session;
// per-track state lives in an owned map so multiple sessions can run
// side by side without shared state.
//
// Track lifecycle (explicit, not buried in conditionals):
//   Outside  -> Dwelling   first update with overlap ratio above threshold
//   Dwelling -> Alerted    dwell >= timeout while still overlapping
//   Dwelling -> Outside    overlap drops to or below threshold
//   Alerted  -> Outside    overlap drops to or below threshold
//
// Exiting the ROI removes the track entry entirely, so alert memory never
// survives an exit: a re-entry starts a fresh dwell episode and must wait
// the full timeout again.

use crate::geometry::Rect;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Phase of a track that is currently inside the ROI. Tracks outside the
/// ROI have no entry in the map at all.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TrackPhase {
    /// Inside the ROI, dwell timer running, not yet alerted.
    Dwelling { entered_at: f64 },
    /// Dwell timeout crossed; alerting until the track leaves the ROI.
    Alerted { entered_at: f64 },
}

#[derive(Debug, Clone, Copy)]
struct TrackEntry {
    phase: TrackPhase,
    last_seen: f64,
}

pub struct RoiDwellMonitor {
    roi: Rect,
    /// Fraction of the detection box's own area (not the ROI's) that must
    /// lie inside the ROI. Strictly greater-than; 0.5 in the reference.
    overlap_threshold: f32,
    /// Seconds a track must continuously overlap before alerting.
    dwell_timeout: f64,
    tracks: HashMap<u64, TrackEntry>,
}

impl RoiDwellMonitor {
    pub fn new(roi: Rect, overlap_threshold: f32, dwell_timeout: f64) -> Self {
        Self {
            roi,
            overlap_threshold,
            dwell_timeout,
            tracks: HashMap::new(),
        }
    }

    pub fn roi(&self) -> Rect {
        self.roi
    }

    /// Fraction of `bbox`'s own area that lies inside the ROI.
    /// A zero or degenerate box area yields 0.0, never NaN or infinity.
    pub fn overlap_ratio(&self, bbox: &Rect) -> f32 {
        let area = bbox.area();
        if area <= 0.0 {
            return 0.0;
        }
        bbox.intersection_area(&self.roi) / area
    }

    /// Advance the state machine for one detection. Returns whether the
    /// track is alerting as of this update. `now` is the caller's timestamp
    /// in seconds (wall, monotonic, or presentation time — the monitor only
    /// requires it to be non-decreasing per track).
    pub fn update(&mut self, track_id: u64, bbox: &Rect, now: f64) -> bool {
        let ratio = self.overlap_ratio(bbox);

        if ratio > self.overlap_threshold {
            let entry = self.tracks.entry(track_id).or_insert_with(|| {
                debug!("Track {} entered ROI (ratio {:.2})", track_id, ratio);
                TrackEntry {
                    phase: TrackPhase::Dwelling { entered_at: now },
                    last_seen: now,
                }
            });
            entry.last_seen = now;

            match entry.phase {
                TrackPhase::Alerted { .. } => true,
                TrackPhase::Dwelling { entered_at } => {
                    let dwell = now - entered_at;
                    if dwell >= self.dwell_timeout {
                        info!(
                            "🔴 Track {} loitering: dwelled {:.1}s in ROI (timeout {:.1}s)",
                            track_id, dwell, self.dwell_timeout
                        );
                        entry.phase = TrackPhase::Alerted { entered_at };
                        true
                    } else {
                        false
                    }
                }
            }
        } else {
            // Exit fully resets the track, alert memory included.
            if let Some(entry) = self.tracks.remove(&track_id) {
                match entry.phase {
                    TrackPhase::Alerted { entered_at } => info!(
                        "Track {} left ROI, alert retracted (dwelled {:.1}s)",
                        track_id,
                        now - entered_at
                    ),
                    TrackPhase::Dwelling { .. } => {
                        debug!("Track {} left ROI before timeout", track_id)
                    }
                }
            }
            false
        }
    }

    /// True iff at least one track is currently alerting. Drives the
    /// ROI-wide outline color, independent of any single track.
    pub fn has_active_alerts(&self) -> bool {
        self.tracks
            .values()
            .any(|e| matches!(e.phase, TrackPhase::Alerted { .. }))
    }

    /// Number of tracks currently alerting.
    pub fn active_alert_count(&self) -> usize {
        self.tracks
            .values()
            .filter(|e| matches!(e.phase, TrackPhase::Alerted { .. }))
            .count()
    }

    /// Whether the track was inside the ROI on its most recent update.
    pub fn is_inside(&self, track_id: u64) -> bool {
        self.tracks.contains_key(&track_id)
    }

    /// Whether the track is currently alerting.
    pub fn is_alerting(&self, track_id: u64) -> bool {
        matches!(
            self.tracks.get(&track_id).map(|e| e.phase),
            Some(TrackPhase::Alerted { .. })
        )
    }

    /// How long the track has been inside the ROI as of `now`.
    pub fn dwell_seconds(&self, track_id: u64, now: f64) -> Option<f64> {
        self.tracks.get(&track_id).map(|e| match e.phase {
            TrackPhase::Dwelling { entered_at } | TrackPhase::Alerted { entered_at } => {
                now - entered_at
            }
        })
    }

    /// Number of tracks currently inside the ROI.
    pub fn tracked_count(&self) -> usize {
        self.tracks.len()
    }

    /// Drop tracks that stopped reporting (the tracker lost them while they
    /// were inside the ROI). Without this, a long-running session with many
    /// distinct track ids grows without bound. Returns the evicted ids with
    /// whether each was alerting at eviction time.
    pub fn evict_stale(&mut self, now: f64, max_age: f64) -> Vec<(u64, bool)> {
        let stale: Vec<u64> = self
            .tracks
            .iter()
            .filter(|(_, e)| now - e.last_seen > max_age)
            .map(|(id, _)| *id)
            .collect();

        let mut evicted = Vec::with_capacity(stale.len());
        for id in stale {
            if let Some(entry) = self.tracks.remove(&id) {
                let was_alerting = matches!(entry.phase, TrackPhase::Alerted { .. });
                if was_alerting {
                    warn!(
                        "⏰ Evicting stale alerting track {} (last seen {:.1}s ago)",
                        id,
                        now - entry.last_seen
                    );
                }
                evicted.push((id, was_alerting));
            }
        }
        evicted
    }
}
