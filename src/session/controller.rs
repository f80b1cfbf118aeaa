use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use log::{info, warn};
use tokio::sync::{watch, Mutex, OnceCell};
use uuid::Uuid;

use crate::{
    analysis::aggregate_session,
    detector::{CapabilityState, DetectorProvider, FaceDetector},
    metrics::{MetricsCollector, MetricsSnapshot},
    models::{AnalysisMode, CompletedRecording, SessionMetrics},
    sensing::{LiveStatus, SamplerContext, SamplerController},
    settings::AnalysisSettings,
    video::VideoSource,
};

use super::accumulator::SessionAccumulator;
use super::state::RecordingStatus;

/// Outcome of the one detector load; the error side keeps the reason.
type LoadedDetector = std::result::Result<Arc<dyn FaceDetector>, String>;

struct ControllerState {
    mode: AnalysisMode,
    source: Option<Arc<dyn VideoSource>>,
    last_metrics: Option<SessionMetrics>,
}

/// Drives one candidate's recordings: analysis mode, camera/detector wiring,
/// and the start / stop / reset lifecycle.
///
/// Cloning is cheap and every clone controls the same session.
#[derive(Clone)]
pub struct RecordingController {
    settings: AnalysisSettings,
    state: Arc<Mutex<ControllerState>>,
    detector: Arc<OnceCell<LoadedDetector>>,
    accumulator: SessionAccumulator,
    sampler: Arc<Mutex<SamplerController>>,
    live_tx: watch::Sender<LiveStatus>,
    metrics: MetricsCollector,
}

impl RecordingController {
    pub fn new(settings: AnalysisSettings) -> Self {
        let (live_tx, _) = watch::channel(LiveStatus::Idle);

        Self {
            state: Arc::new(Mutex::new(ControllerState {
                mode: settings.default_mode,
                source: None,
                last_metrics: None,
            })),
            detector: Arc::new(OnceCell::new()),
            settings,
            accumulator: SessionAccumulator::new(),
            sampler: Arc::new(Mutex::new(SamplerController::new())),
            live_tx,
            metrics: MetricsCollector::new(),
        }
    }

    /// Binds a camera and loads the detector on first use.
    ///
    /// A detector that fails to load is reported once through the returned
    /// state and never retried; recordings then carry no video analysis.
    /// The load runs without holding the session state, so recordings can be
    /// stopped while it is pending.
    ///
    /// Attaching a different camera rebinds a running sampler to it.
    pub async fn attach_camera(
        &self,
        source: Arc<dyn VideoSource>,
        provider: &dyn DetectorProvider,
    ) -> CapabilityState {
        self.detector
            .get_or_init(|| async {
                match provider.load(&self.settings.detector).await {
                    Ok(detector) => {
                        info!("Face detector loaded");
                        Ok(detector)
                    }
                    Err(err) => {
                        warn!("Face detector unavailable, continuing audio-only: {err:#}");
                        Err(format!("{err:#}"))
                    }
                }
            })
            .await;

        let mut state = self.state.lock().await;
        let rebinding = state
            .source
            .as_ref()
            .is_some_and(|current| !same_source(current, &source));
        state.source = Some(source);

        if rebinding {
            self.sampler.lock().await.stop();
        }

        if state.mode == AnalysisMode::Video {
            if let Err(err) = self.ensure_sampler(&state).await {
                warn!("Face sampler not started: {err:#}");
            }
        }

        self.capability()
    }

    /// Stops sampling and forgets the camera. The loaded detector is kept.
    pub async fn detach_camera(&self) {
        let mut state = self.state.lock().await;
        self.sampler.lock().await.stop();
        state.source = None;
    }

    pub async fn select_mode(&self, mode: AnalysisMode) -> Result<()> {
        let mut state = self.state.lock().await;
        if self.accumulator.status().await == RecordingStatus::Recording {
            bail!("cannot change analysis mode while recording");
        }

        match mode {
            AnalysisMode::Video => {
                if state.source.is_some() {
                    self.ensure_sampler(&state).await?;
                }
            }
            AnalysisMode::Audio => self.sampler.lock().await.stop(),
        }
        state.mode = mode;

        info!("Analysis mode set to {}", mode.as_str());
        Ok(())
    }

    /// Begins a new recording with an empty sample buffer; returns its id.
    pub async fn start_recording(&self) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        self.accumulator
            .begin(session_id.clone(), started_at)
            .await
            .map_err(|err| anyhow!("cannot start recording: {err}"))?;
        self.metrics.reset().await;

        let mode = self.state.lock().await.mode;
        info!("Recording {} started ({} mode)", session_id, mode.as_str());
        Ok(session_id)
    }

    /// Ends the active recording and aggregates its samples exactly once.
    pub async fn stop_recording(&self) -> Result<CompletedRecording> {
        let stopped_at = Utc::now();
        let finished = self
            .accumulator
            .finish(stopped_at)
            .await
            .ok_or_else(|| anyhow!("no active recording to stop"))?;

        let mut state = self.state.lock().await;
        let analyze = state.mode == AnalysisMode::Video && self.capability().is_ready();
        let video_analysis = analyze.then(|| aggregate_session(&finished.buffer));
        state.last_metrics = video_analysis.clone();

        info!(
            "Recording {} stopped with {} samples{}",
            finished.session_id,
            finished.buffer.len(),
            if analyze { "" } else { " (no video analysis)" }
        );

        Ok(CompletedRecording {
            session_id: finished.session_id,
            mode: state.mode,
            started_at: finished.started_at,
            stopped_at: finished.stopped_at,
            sample_count: finished.buffer.len(),
            video_analysis,
        })
    }

    /// Discards the current or last recording's samples and metrics.
    pub async fn reset(&self) {
        self.accumulator.reset().await;
        self.state.lock().await.last_metrics = None;
    }

    /// Stops the sampler; the controller can be reused afterwards.
    pub async fn shutdown(&self) {
        self.sampler.lock().await.stop();
    }

    pub fn subscribe_live(&self) -> watch::Receiver<LiveStatus> {
        self.live_tx.subscribe()
    }

    pub fn capability(&self) -> CapabilityState {
        match self.detector.get() {
            None => CapabilityState::NotLoaded,
            Some(Ok(_)) => CapabilityState::Ready,
            Some(Err(reason)) => CapabilityState::Unavailable {
                reason: reason.clone(),
            },
        }
    }

    pub async fn mode(&self) -> AnalysisMode {
        self.state.lock().await.mode
    }

    pub async fn status(&self) -> RecordingStatus {
        self.accumulator.status().await
    }

    pub async fn is_sampling(&self) -> bool {
        self.sampler.lock().await.is_running()
    }

    pub async fn last_metrics(&self) -> Option<SessionMetrics> {
        self.state.lock().await.last_metrics.clone()
    }

    pub async fn sampler_metrics(&self) -> MetricsSnapshot {
        self.metrics.get_snapshot().await
    }

    async fn ensure_sampler(&self, state: &ControllerState) -> Result<()> {
        let mut sampler = self.sampler.lock().await;
        if sampler.is_running() {
            return Ok(());
        }

        let detector = self.detector.get().and_then(|loaded| loaded.as_ref().ok());
        let (Some(source), Some(detector)) = (state.source.clone(), detector.cloned()) else {
            // No camera, or detector unavailable: stay audio-only
            return Ok(());
        };

        sampler.start(
            SamplerContext {
                source,
                detector,
                accumulator: self.accumulator.clone(),
                live_tx: self.live_tx.clone(),
                metrics: self.metrics.clone(),
            },
            self.settings.sample_interval(),
        )
    }
}

fn same_source(a: &Arc<dyn VideoSource>, b: &Arc<dyn VideoSource>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
