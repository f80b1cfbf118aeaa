//! Offline replay: runs a recorded detection scenario through the full
//! sampling / recording / aggregation pipeline against a still frame.

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    analysis::{build_report, VideoReport},
    detector::{CapabilityState, ScriptStep, ScriptedDetector, ScriptedProvider},
    metrics::MetricsSnapshot,
    models::{AnalysisMode, CompletedRecording, FrameDetection},
    session::RecordingController,
    settings::{AnalysisSettings, SettingsStore},
    video::{StaticVideoSource, VideoSource},
};

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    pub scenario: PathBuf,
    pub frame: Option<PathBuf>,
    pub settings: Option<PathBuf>,
    /// Overrides the settings file's sampling interval
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutput {
    pub capability: CapabilityState,
    pub recording: CompletedRecording,
    pub report: Option<VideoReport>,
    pub telemetry: MetricsSnapshot,
}

/// Accepts either a plain array of detections / nulls, or tagged script steps
/// (`{"face": ...}`, `"noFace"`, `{"fail": "..."}`).
pub fn parse_scenario(raw: &str) -> Result<Vec<ScriptStep>> {
    if let Ok(frames) = serde_json::from_str::<Vec<Option<FrameDetection>>>(raw) {
        return Ok(frames.into_iter().map(ScriptStep::from).collect());
    }
    serde_json::from_str::<Vec<ScriptStep>>(raw).context("scenario is not a list of detections")
}

fn load_settings(options: &ReplayOptions) -> Result<AnalysisSettings> {
    let mut settings = match &options.settings {
        Some(path) => SettingsStore::new(path.clone())?.analysis(),
        None => AnalysisSettings::default(),
    };
    if let Some(ms) = options.interval_ms {
        settings.sample_interval_ms = ms;
    }
    Ok(settings)
}

pub async fn run_replay(options: &ReplayOptions) -> Result<ReplayOutput> {
    let raw = fs::read_to_string(&options.scenario)
        .with_context(|| format!("Failed to read scenario {}", options.scenario.display()))?;
    let steps = parse_scenario(&raw)?;
    let settings = load_settings(options)?;
    let interval = settings.sample_interval();

    let source: Arc<dyn VideoSource> = match &options.frame {
        Some(path) => Arc::new(StaticVideoSource::from_path(path)?),
        None => Arc::new(StaticVideoSource::blank()),
    };

    info!(
        "Replaying {} scripted detections every {}ms",
        steps.len(),
        interval.as_millis()
    );

    let detector = Arc::new(ScriptedDetector::new(steps));
    let controller = RecordingController::new(settings);

    controller.select_mode(AnalysisMode::Video).await?;
    controller.start_recording().await?;
    let capability = controller
        .attach_camera(source, &ScriptedProvider::ready(Arc::clone(&detector)))
        .await;

    while controller.is_sampling().await && detector.remaining() > 0 {
        tokio::time::sleep(interval).await;
    }
    // Let the last dispatched detection land
    tokio::time::sleep(interval).await;

    let recording = controller.stop_recording().await?;
    controller.shutdown().await;

    let report = recording.video_analysis.as_ref().and_then(build_report);
    if recording.video_analysis.is_some() && report.is_none() {
        info!("Candidate never looked at the camera; report suppressed");
    }

    Ok(ReplayOutput {
        capability,
        recording,
        report,
        telemetry: controller.sampler_metrics().await,
    })
}
