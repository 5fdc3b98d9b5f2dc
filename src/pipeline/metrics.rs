// src/pipeline/metrics.rs
//
// Production observability. Counts frames, detections, and alert
// transitions for the whole session. Export via logs at end of stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct LoiterMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub detections_processed: Arc<AtomicU64>,
    pub monitored_detections: Arc<AtomicU64>,
    pub roi_entries: Arc<AtomicU64>,
    pub roi_exits: Arc<AtomicU64>,
    pub alerts_raised: Arc<AtomicU64>,
    pub alerts_retracted: Arc<AtomicU64>,
    pub tracks_evicted: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl LoiterMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            detections_processed: Arc::new(AtomicU64::new(0)),
            monitored_detections: Arc::new(AtomicU64::new(0)),
            roi_entries: Arc::new(AtomicU64::new(0)),
            roi_exits: Arc::new(AtomicU64::new(0)),
            alerts_raised: Arc::new(AtomicU64::new(0)),
            alerts_retracted: Arc::new(AtomicU64::new(0)),
            tracks_evicted: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            detections_processed: self.detections_processed.load(Ordering::Relaxed),
            monitored_detections: self.monitored_detections.load(Ordering::Relaxed),
            roi_entries: self.roi_entries.load(Ordering::Relaxed),
            roi_exits: self.roi_exits.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            alerts_retracted: self.alerts_retracted.load(Ordering::Relaxed),
            tracks_evicted: self.tracks_evicted.load(Ordering::Relaxed),
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for LoiterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub detections_processed: u64,
    pub monitored_detections: u64,
    pub roi_entries: u64,
    pub roi_exits: u64,
    pub alerts_raised: u64,
    pub alerts_retracted: u64,
    pub tracks_evicted: u64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
