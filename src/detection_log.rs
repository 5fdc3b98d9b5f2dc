// src/detection_log.rs
//
// Replay input for the excluded decode/infer/track pipeline: detection
// records dumped one JSON object per line, ordered by frame. The reader
// streams them back grouped into per-frame batches.

use crate::types::{Detection, FrameBatch};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Find all detection log files under the input directory.
pub fn find_detection_logs(input_dir: &str) -> Result<Vec<PathBuf>> {
    let mut logs = Vec::new();

    for entry in WalkDir::new(input_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if let Some(ext) = path.extension() {
            if ext == "jsonl" {
                logs.push(path.to_path_buf());
            }
        }
    }

    logs.sort();
    info!("Found {} detection log files", logs.len());
    Ok(logs)
}

pub struct DetectionLogReader<R> {
    reader: R,
    /// First record of the next frame, read ahead while grouping
    pending: Option<Detection>,
    line_no: u64,
    pub frames_read: u64,
}

impl DetectionLogReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening detection log: {}", path.display());
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> DetectionLogReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            pending: None,
            line_no: 0,
            frames_read: 0,
        }
    }

    fn next_record(&mut self) -> Result<Option<Detection>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let det: Detection = serde_json::from_str(trimmed)
                .with_context(|| format!("malformed detection record at line {}", self.line_no))?;
            return Ok(Some(det));
        }
    }

    /// Read the next frame's worth of detections. Consecutive records with
    /// the same frame_id form one batch; the frame timestamp is taken from
    /// the first record.
    pub fn next_frame(&mut self) -> Result<Option<FrameBatch>> {
        let first = match self.pending.take() {
            Some(det) => det,
            None => match self.next_record()? {
                Some(det) => det,
                None => return Ok(None),
            },
        };

        let frame_id = first.frame_id;
        let timestamp = first.timestamp;
        let mut detections = vec![first];

        loop {
            match self.next_record()? {
                Some(det) if det.frame_id == frame_id => detections.push(det),
                Some(det) => {
                    self.pending = Some(det);
                    break;
                }
                None => break,
            }
        }

        self.frames_read += 1;
        Ok(Some(FrameBatch {
            frame_id,
            timestamp,
            detections,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
{"frame_id":0,"track_id":1,"class_id":0,"left":150.0,"top":150.0,"width":50.0,"height":50.0,"confidence":0.91,"timestamp":0.0}
{"frame_id":0,"track_id":2,"class_id":1,"left":10.0,"top":10.0,"width":30.0,"height":30.0,"confidence":0.62,"timestamp":0.0}

{"frame_id":1,"track_id":1,"class_id":0,"left":152.0,"top":151.0,"width":50.0,"height":50.0,"confidence":0.90,"timestamp":0.033}
"#;

    #[test]
    fn test_groups_records_by_frame() {
        let mut reader = DetectionLogReader::from_reader(SAMPLE.as_bytes());

        let f0 = reader.next_frame().unwrap().unwrap();
        assert_eq!(f0.frame_id, 0);
        assert_eq!(f0.detections.len(), 2);
        assert_eq!(f0.timestamp, 0.0);

        let f1 = reader.next_frame().unwrap().unwrap();
        assert_eq!(f1.frame_id, 1);
        assert_eq!(f1.detections.len(), 1);
        assert_eq!(f1.detections[0].track_id, 1);

        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.frames_read, 2);
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let mut reader = DetectionLogReader::from_reader("not json\n".as_bytes());
        assert!(reader.next_frame().is_err());
    }

    #[test]
    fn test_empty_log() {
        let mut reader = DetectionLogReader::from_reader("".as_bytes());
        assert!(reader.next_frame().unwrap().is_none());
    }
}
