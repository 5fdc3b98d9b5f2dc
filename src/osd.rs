// src/osd.rs
//
// Annotation instructions for the external on-screen-display renderer.
// This crate never draws; it only tells the renderer what to draw:
// border colors, "ID=<n> <label>" texts, and the per-frame summary line.

use crate::geometry::Rect;
use serde::Serialize;

/// RGBA color, components in 0.0..=1.0 like NvOSD color params.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Default object border: blue at 0.8 alpha
pub const COLOR_TRACKED: Rgba = Rgba {
    r: 0.0,
    g: 0.0,
    b: 1.0,
    a: 0.8,
};

/// Loitering object border: red
pub const COLOR_ALERT: Rgba = Rgba {
    r: 1.0,
    g: 0.0,
    b: 0.0,
    a: 0.8,
};

/// ROI outline while no alert is active
pub const COLOR_ROI_IDLE: Rgba = Rgba {
    r: 0.0,
    g: 1.0,
    b: 0.0,
    a: 0.6,
};

/// ROI outline while at least one track is loitering
pub const COLOR_ROI_ALERT: Rgba = Rgba {
    r: 1.0,
    g: 0.0,
    b: 0.0,
    a: 0.6,
};

/// Border and label for one detected object.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectAnnotation {
    pub track_id: u64,
    pub class_id: u32,
    pub bbox: Rect,
    pub border_color: Rgba,
    pub label: String,
    pub alerting: bool,
}

impl ObjectAnnotation {
    pub fn new(track_id: u64, class_id: u32, bbox: Rect, label: &str, alerting: bool) -> Self {
        Self {
            track_id,
            class_id,
            bbox,
            border_color: if alerting { COLOR_ALERT } else { COLOR_TRACKED },
            label: format!("ID={} {}", track_id, label),
            alerting,
        }
    }
}

/// Outline instruction for the monitored region itself.
#[derive(Debug, Clone, Serialize)]
pub struct RoiAnnotation {
    pub bounds: Rect,
    pub border_color: Rgba,
    pub any_alert: bool,
}

impl RoiAnnotation {
    pub fn new(bounds: Rect, any_alert: bool) -> Self {
        Self {
            bounds,
            border_color: if any_alert {
                COLOR_ROI_ALERT
            } else {
                COLOR_ROI_IDLE
            },
            any_alert,
        }
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameAnnotations {
    pub frame_id: u64,
    pub timestamp: f64,
    pub objects: Vec<ObjectAnnotation>,
    pub roi: RoiAnnotation,
    pub summary_text: String,
}

/// Per-frame summary line in the original OSD format:
/// frame number, total objects, then one count per class label.
pub fn frame_summary_text(frame_id: u64, total_objects: usize, counts: &[(String, u64)]) -> String {
    let mut text = format!(
        "Frame Number={} Number of Objects={}",
        frame_id, total_objects
    );
    for (label, count) in counts {
        text.push_str(&format!(" {}_count={}", capitalize(label), count));
    }
    text
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_annotation_colors() {
        let bbox = Rect::new(0.0, 0.0, 10.0, 10.0);
        let calm = ObjectAnnotation::new(7, 0, bbox, "person", false);
        assert_eq!(calm.border_color, COLOR_TRACKED);
        assert_eq!(calm.label, "ID=7 person");

        let hot = ObjectAnnotation::new(7, 0, bbox, "person", true);
        assert_eq!(hot.border_color, COLOR_ALERT);
    }

    #[test]
    fn test_roi_annotation_color_follows_alert_flag() {
        let roi = Rect::new(100.0, 100.0, 200.0, 200.0);
        assert_eq!(RoiAnnotation::new(roi, false).border_color, COLOR_ROI_IDLE);
        assert_eq!(RoiAnnotation::new(roi, true).border_color, COLOR_ROI_ALERT);
    }

    #[test]
    fn test_frame_summary_text_format() {
        let counts = vec![
            ("person".to_string(), 3),
            ("bag".to_string(), 1),
            ("face".to_string(), 0),
        ];
        let text = frame_summary_text(42, 4, &counts);
        assert_eq!(
            text,
            "Frame Number=42 Number of Objects=4 Person_count=3 Bag_count=1 Face_count=0"
        );
    }
}
