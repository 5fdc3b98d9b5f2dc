use crate::types::Config;
use anyhow::Result;
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
roi: { left: 100.0, top: 100.0, width: 200.0, height: 200.0 }
dwell:
  timeout_seconds: 2.0
classes:
  monitored_class_id: 0
  labels: ["person", "bag", "face"]
input:
  input_dir: "detections"
  output_dir: "output"
alert_api: {}
logging:
  level: "info"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.dwell.overlap_threshold, 0.5);
        assert_eq!(config.dwell.timeout_seconds, 2.0);
        assert_eq!(config.roi.rect().area(), 40000.0);
        assert_eq!(config.classes.label(2), "face");
        assert_eq!(config.classes.label(9), "unknown");
        assert!(!config.alert_api.send_to_api);
    }
}
