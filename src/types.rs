use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub roi: RoiConfig,
    pub dwell: DwellConfig,
    pub classes: ClassConfig,
    pub input: InputConfig,
    pub alert_api: AlertApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiConfig {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl RoiConfig {
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DwellConfig {
    /// Fraction of a detection box's own area that must lie inside the ROI
    #[serde(default = "default_overlap_threshold")]
    pub overlap_threshold: f32,
    /// Seconds of continuous overlap before an alert is raised
    pub timeout_seconds: f64,
    /// Drop tracks that stopped reporting for this long
    #[serde(default = "default_evict_after")]
    pub evict_after_seconds: f64,
    /// How often (in frames) to sweep for stale tracks
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_frames: u32,
}

fn default_overlap_threshold() -> f32 {
    0.5
}

fn default_evict_after() -> f64 {
    30.0
}

fn default_sweep_interval() -> u32 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Class id the dwell monitor runs on (person for PeopleNet)
    pub monitored_class_id: u32,
    /// Display labels indexed by class id
    pub labels: Vec<String>,
}

impl ClassConfig {
    pub fn label(&self, class_id: u32) -> &str {
        self.labels
            .get(class_id as usize)
            .map(|s| s.as_str())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory scanned for detection log files (.jsonl)
    pub input_dir: String,
    pub output_dir: String,
    /// Write alert events as JSON lines into the output directory
    #[serde(default)]
    pub save_events: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertApiConfig {
    #[serde(default)]
    pub send_to_api: bool,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    "http://localhost:3000/api/alerts".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// One detection record from the external detector/tracker, as dumped
/// per frame per object into the detection log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub frame_id: u64,
    pub track_id: u64,
    pub class_id: u32,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Seconds; presentation time of the frame this detection belongs to
    pub timestamp: f64,
}

impl Detection {
    pub fn bbox(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }
}

/// All detections belonging to a single frame.
#[derive(Debug, Clone)]
pub struct FrameBatch {
    pub frame_id: u64,
    pub timestamp: f64,
    pub detections: Vec<Detection>,
}
