// src/main.rs

mod alert_api;
mod config;
mod detection_log;
mod dwell;
mod frame_driver;
mod geometry;
mod osd;
mod pipeline;
mod types;

use alert_api::{build_alert_payload, save_events_to_file, send_alert_to_api};
use anyhow::Result;
use detection_log::{find_detection_logs, DetectionLogReader};
use frame_driver::FrameDriver;
use pipeline::RoiEvent;
use std::path::Path;
use tracing::{debug, error, info, warn};
use types::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("loiter_detection={}", config.logging.level))
        .init();

    info!("👁  ROI Loitering Detection Starting");
    info!("✓ Configuration loaded");
    info!(
        "ROI: ({:.0},{:.0}) {:.0}x{:.0} | overlap > {:.2} | dwell timeout {:.1}s",
        config.roi.left,
        config.roi.top,
        config.roi.width,
        config.roi.height,
        config.dwell.overlap_threshold,
        config.dwell.timeout_seconds
    );

    let api_url = std::env::var("ALERT_API_URL").unwrap_or_else(|_| config.alert_api.api_url.clone());
    let client = if config.alert_api.send_to_api {
        info!("📡 Alert API URL: {}", api_url);
        Some(reqwest::Client::new())
    } else {
        None
    };

    let logs = find_detection_logs(&config.input.input_dir)?;
    if logs.is_empty() {
        error!("No detection logs found in {}", config.input.input_dir);
        return Ok(());
    }

    info!("Found {} stream(s) to process", logs.len());

    for (idx, log_path) in logs.iter().enumerate() {
        info!("\n========================================");
        info!(
            "Processing stream {}/{}: {}",
            idx + 1,
            logs.len(),
            log_path.display()
        );
        info!("========================================\n");

        match process_stream(log_path, &config, client.as_ref(), &api_url).await {
            Ok(()) => info!("✓ Stream processed successfully"),
            Err(e) => error!("✗ Stream failed: {:#}", e),
        }
    }

    Ok(())
}

async fn process_stream(
    log_path: &Path,
    config: &Config,
    client: Option<&reqwest::Client>,
    api_url: &str,
) -> Result<()> {
    let source = log_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stream")
        .to_string();

    // Each stream gets its own engine instance; per-track state is never
    // shared across sessions.
    let mut driver = FrameDriver::new(config);
    let mut reader = DetectionLogReader::open(log_path)?;
    let mut session_events: Vec<RoiEvent> = Vec::new();

    while let Some(batch) = reader.next_frame()? {
        let annotations = driver.process_frame(&batch);
        debug!("{}", annotations.summary_text);

        for event in driver.drain_events() {
            match &event {
                RoiEvent::AlertRaised {
                    track_id,
                    dwell_seconds,
                    ..
                } => {
                    info!(
                        "🚨 [{}] track {} loitering after {:.1}s",
                        source, track_id, dwell_seconds
                    );
                    deliver_event(config, client, api_url, &source, &event).await;
                }
                RoiEvent::AlertRetracted { track_id, .. } => {
                    info!("✅ [{}] track {} alert cleared", source, track_id);
                    deliver_event(config, client, api_url, &source, &event).await;
                }
                RoiEvent::TrackEnteredRoi { track_id, .. } => {
                    debug!("[{}] track {} entered ROI", source, track_id)
                }
                RoiEvent::TrackExitedRoi { track_id, .. } => {
                    debug!("[{}] track {} exited ROI", source, track_id)
                }
                RoiEvent::TrackEvicted { track_id, .. } => {
                    warn!("[{}] track {} evicted as stale", source, track_id)
                }
            }
            session_events.push(event);
        }
    }

    if config.input.save_events && !session_events.is_empty() {
        save_events_to_file(&config.input.output_dir, &source, &session_events)?;
    }

    let summary = driver.metrics().summary();
    info!(
        "Stream summary: {} frames, {} detections, {} alerts raised, {} retracted",
        summary.total_frames,
        summary.detections_processed,
        summary.alerts_raised,
        summary.alerts_retracted
    );
    debug!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

async fn deliver_event(
    config: &Config,
    client: Option<&reqwest::Client>,
    api_url: &str,
    source: &str,
    event: &RoiEvent,
) {
    let Some(client) = client else {
        return;
    };

    let payload = build_alert_payload(config, source, event);
    if let Err(e) = send_alert_to_api(client, api_url, &payload).await {
        // Delivery failure must not stall the detection loop
        warn!("Failed to deliver alert event: {:#}", e);
    }
}
