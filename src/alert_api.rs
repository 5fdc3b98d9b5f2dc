// src/alert_api.rs
//
// Delivery of ROI events to the outside world: an optional HTTP endpoint
// (security backend, notification service) and an optional JSON-lines
// event file next to the other per-stream outputs.

use crate::pipeline::RoiEvent;
use crate::types::{Config, RoiConfig};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload<'a> {
    /// Stem of the detection log the event came from
    pub source: &'a str,
    pub roi: &'a RoiConfig,
    pub dwell_timeout_seconds: f64,
    #[serde(flatten)]
    pub event: &'a RoiEvent,
}

pub fn build_alert_payload<'a>(
    config: &'a Config,
    source: &'a str,
    event: &'a RoiEvent,
) -> AlertPayload<'a> {
    AlertPayload {
        source,
        roi: &config.roi,
        dwell_timeout_seconds: config.dwell.timeout_seconds,
        event,
    }
}

/// POST one event to the configured alert endpoint. Delivery failures are
/// logged and reported to the caller but must never abort the stream.
pub async fn send_alert_to_api(
    client: &reqwest::Client,
    api_url: &str,
    payload: &AlertPayload<'_>,
) -> Result<()> {
    debug!("Sending alert event to {}", api_url);

    let response = client
        .post(api_url)
        .json(payload)
        .send()
        .await
        .with_context(|| format!("failed to reach alert API at {}", api_url))?;

    if !response.status().is_success() {
        warn!("Alert API returned status {}", response.status());
        anyhow::bail!("alert API returned status {}", response.status());
    }

    Ok(())
}

/// Append events for one stream as JSON lines under the output directory.
pub fn save_events_to_file(
    output_dir: &str,
    source: &str,
    events: &[RoiEvent],
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = Path::new(output_dir).join(format!("{}_events.jsonl", source));
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    for event in events {
        let line = serde_json::to_string(event)?;
        writeln!(file, "{}", line)?;
    }

    info!("Saved {} events to {}", events.len(), path.display());
    Ok(path)
}
