// src/frame_driver.rs
//
// Boundary adapter between the external detector/tracker and the dwell
// monitor. Consumes one batch of detections per frame, runs the state
// machine for the monitored class, publishes transition events, and
// produces the annotation instructions the renderer consumes.

use crate::dwell::RoiDwellMonitor;
use crate::geometry::Rect;
use crate::osd::{frame_summary_text, FrameAnnotations, ObjectAnnotation, RoiAnnotation};
use crate::pipeline::{EventBus, LoiterMetrics, RoiEvent};
use crate::types::{ClassConfig, Config, FrameBatch};

const MAX_PENDING_EVENTS: usize = 256;

pub struct FrameDriver {
    monitor: RoiDwellMonitor,
    classes: ClassConfig,
    evict_after: f64,
    sweep_interval: u32,
    frames_since_sweep: u32,
    events: EventBus,
    metrics: LoiterMetrics,
}

impl FrameDriver {
    pub fn new(config: &Config) -> Self {
        Self {
            monitor: RoiDwellMonitor::new(
                config.roi.rect(),
                config.dwell.overlap_threshold,
                config.dwell.timeout_seconds,
            ),
            classes: config.classes.clone(),
            evict_after: config.dwell.evict_after_seconds,
            sweep_interval: config.dwell.sweep_interval_frames,
            frames_since_sweep: 0,
            events: EventBus::new(MAX_PENDING_EVENTS),
            metrics: LoiterMetrics::new(),
        }
    }

    /// Process all detections of one frame and return the annotations
    /// for it. Must be called with frames in presentation order.
    pub fn process_frame(&mut self, batch: &FrameBatch) -> FrameAnnotations {
        self.metrics.inc(&self.metrics.total_frames);

        let mut class_counts: Vec<u64> = vec![0; self.classes.labels.len()];
        let mut objects = Vec::with_capacity(batch.detections.len());

        for det in &batch.detections {
            self.metrics.inc(&self.metrics.detections_processed);
            if let Some(count) = class_counts.get_mut(det.class_id as usize) {
                *count += 1;
            }

            let alerting = if det.class_id == self.classes.monitored_class_id {
                self.metrics.inc(&self.metrics.monitored_detections);
                self.update_monitored(det.track_id, &det.bbox(), det.timestamp)
            } else {
                false
            };

            objects.push(ObjectAnnotation::new(
                det.track_id,
                det.class_id,
                det.bbox(),
                self.classes.label(det.class_id),
                alerting,
            ));
        }

        self.maybe_sweep(batch.timestamp);

        let counts: Vec<(String, u64)> = self
            .classes
            .labels
            .iter()
            .cloned()
            .zip(class_counts)
            .collect();

        FrameAnnotations {
            frame_id: batch.frame_id,
            timestamp: batch.timestamp,
            objects,
            roi: RoiAnnotation::new(self.monitor.roi(), self.monitor.has_active_alerts()),
            summary_text: frame_summary_text(batch.frame_id, batch.detections.len(), &counts),
        }
    }

    /// Run one monitor update and turn the before/after state difference
    /// into transition events.
    fn update_monitored(&mut self, track_id: u64, bbox: &Rect, now: f64) -> bool {
        let was_inside = self.monitor.is_inside(track_id);
        let was_alerting = self.monitor.is_alerting(track_id);

        let alerting = self.monitor.update(track_id, bbox, now);
        let now_inside = self.monitor.is_inside(track_id);

        if !was_inside && now_inside {
            self.metrics.inc(&self.metrics.roi_entries);
            self.events.publish(RoiEvent::TrackEnteredRoi {
                track_id,
                timestamp: now,
            });
        }

        if was_inside && !now_inside {
            self.metrics.inc(&self.metrics.roi_exits);
            self.events.publish(RoiEvent::TrackExitedRoi {
                track_id,
                timestamp: now,
                was_alerting,
            });
            if was_alerting {
                self.metrics.inc(&self.metrics.alerts_retracted);
                self.events.publish(RoiEvent::AlertRetracted {
                    track_id,
                    timestamp: now,
                });
            }
        }

        if !was_alerting && alerting {
            self.metrics.inc(&self.metrics.alerts_raised);
            self.events.publish(RoiEvent::AlertRaised {
                track_id,
                timestamp: now,
                dwell_seconds: self.monitor.dwell_seconds(track_id, now).unwrap_or(0.0),
            });
        }

        alerting
    }

    fn maybe_sweep(&mut self, now: f64) {
        self.frames_since_sweep += 1;
        if self.frames_since_sweep < self.sweep_interval {
            return;
        }
        self.frames_since_sweep = 0;

        for (track_id, was_alerting) in self.monitor.evict_stale(now, self.evict_after) {
            self.metrics.inc(&self.metrics.tracks_evicted);
            if was_alerting {
                self.metrics.inc(&self.metrics.alerts_retracted);
            }
            self.events.publish(RoiEvent::TrackEvicted {
                track_id,
                timestamp: now,
                was_alerting,
            });
        }
    }

    pub fn has_active_alerts(&self) -> bool {
        self.monitor.has_active_alerts()
    }

    pub fn drain_events(&mut self) -> Vec<RoiEvent> {
        self.events.drain()
    }

    pub fn metrics(&self) -> &LoiterMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osd::{COLOR_ALERT, COLOR_TRACKED};
    use crate::types::{
        AlertApiConfig, ClassConfig, Detection, DwellConfig, InputConfig, LoggingConfig, RoiConfig,
    };
    use std::sync::atomic::Ordering;

    fn test_config() -> Config {
        Config {
            roi: RoiConfig {
                left: 100.0,
                top: 100.0,
                width: 200.0,
                height: 200.0,
            },
            dwell: DwellConfig {
                overlap_threshold: 0.5,
                timeout_seconds: 2.0,
                evict_after_seconds: 30.0,
                sweep_interval_frames: 300,
            },
            classes: ClassConfig {
                monitored_class_id: 0,
                labels: vec!["person".to_string(), "bag".to_string(), "face".to_string()],
            },
            input: InputConfig {
                input_dir: "detections".to_string(),
                output_dir: "output".to_string(),
                save_events: false,
            },
            alert_api: AlertApiConfig {
                send_to_api: false,
                api_url: String::new(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    fn detection(frame_id: u64, track_id: u64, class_id: u32, inside: bool, ts: f64) -> Detection {
        let (left, top) = if inside { (150.0, 150.0) } else { (0.0, 0.0) };
        Detection {
            frame_id,
            track_id,
            class_id,
            left,
            top,
            width: 50.0,
            height: 50.0,
            confidence: 0.9,
            timestamp: ts,
        }
    }

    fn batch(frame_id: u64, ts: f64, detections: Vec<Detection>) -> FrameBatch {
        FrameBatch {
            frame_id,
            timestamp: ts,
            detections,
        }
    }

    #[test]
    fn test_alert_raised_after_dwell_and_annotated_red() {
        let mut driver = FrameDriver::new(&test_config());

        let a0 = driver.process_frame(&batch(0, 0.0, vec![detection(0, 1, 0, true, 0.0)]));
        assert!(!a0.objects[0].alerting);
        assert_eq!(a0.objects[0].border_color, COLOR_TRACKED);
        assert!(!a0.roi.any_alert);

        driver.process_frame(&batch(30, 1.0, vec![detection(30, 1, 0, true, 1.0)]));
        let a2 = driver.process_frame(&batch(60, 2.0, vec![detection(60, 1, 0, true, 2.0)]));
        assert!(a2.objects[0].alerting);
        assert_eq!(a2.objects[0].border_color, COLOR_ALERT);
        assert!(a2.roi.any_alert);

        let events = driver.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, RoiEvent::TrackEnteredRoi { track_id: 1, .. })));
        assert!(events.iter().any(
            |e| matches!(e, RoiEvent::AlertRaised { track_id: 1, dwell_seconds, .. } if *dwell_seconds >= 2.0)
        ));
        assert_eq!(driver.metrics().alerts_raised.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_exit_retracts_alert() {
        let mut driver = FrameDriver::new(&test_config());
        driver.process_frame(&batch(0, 0.0, vec![detection(0, 1, 0, true, 0.0)]));
        driver.process_frame(&batch(60, 2.0, vec![detection(60, 1, 0, true, 2.0)]));

        let gone = driver.process_frame(&batch(75, 2.5, vec![detection(75, 1, 0, false, 2.5)]));
        assert!(!gone.objects[0].alerting);
        assert!(!gone.roi.any_alert);

        let events = driver.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            RoiEvent::TrackExitedRoi {
                track_id: 1,
                was_alerting: true,
                ..
            }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, RoiEvent::AlertRetracted { track_id: 1, .. })));
        assert_eq!(driver.metrics().alerts_retracted.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_non_monitored_classes_never_alert() {
        let mut driver = FrameDriver::new(&test_config());

        // A bag sitting in the ROI far past the timeout
        driver.process_frame(&batch(0, 0.0, vec![detection(0, 5, 1, true, 0.0)]));
        let late = driver.process_frame(&batch(300, 10.0, vec![detection(300, 5, 1, true, 10.0)]));

        assert!(!late.objects[0].alerting);
        assert!(!late.roi.any_alert);
        assert!(driver.drain_events().is_empty());
        assert_eq!(
            driver.metrics().monitored_detections.load(Ordering::Relaxed),
            0
        );
    }

    #[test]
    fn test_summary_counts_per_class() {
        let mut driver = FrameDriver::new(&test_config());
        let annotations = driver.process_frame(&batch(
            7,
            0.0,
            vec![
                detection(7, 1, 0, true, 0.0),
                detection(7, 2, 0, false, 0.0),
                detection(7, 3, 1, false, 0.0),
            ],
        ));

        assert_eq!(
            annotations.summary_text,
            "Frame Number=7 Number of Objects=3 Person_count=2 Bag_count=1 Face_count=0"
        );
    }

    #[test]
    fn test_stale_tracks_swept_on_interval() {
        let mut config = test_config();
        config.dwell.sweep_interval_frames = 1;
        config.dwell.evict_after_seconds = 5.0;
        let mut driver = FrameDriver::new(&config);

        driver.process_frame(&batch(0, 0.0, vec![detection(0, 1, 0, true, 0.0)]));
        driver.process_frame(&batch(60, 2.0, vec![detection(60, 1, 0, true, 2.0)]));
        driver.drain_events();

        // Track 1 stops reporting; an unrelated frame far in the future
        // triggers the sweep and retracts the stale alert.
        driver.process_frame(&batch(600, 20.0, vec![detection(600, 9, 1, false, 20.0)]));
        assert!(!driver.has_active_alerts());

        let events = driver.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            RoiEvent::TrackEvicted {
                track_id: 1,
                was_alerting: true,
                ..
            }
        )));
        assert_eq!(driver.metrics().tracks_evicted.load(Ordering::Relaxed), 1);
        assert_eq!(driver.metrics().alerts_retracted.load(Ordering::Relaxed), 1);
    }
}
