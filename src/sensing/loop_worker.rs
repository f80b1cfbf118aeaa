use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    analysis::{extract_signals, to_samples},
    detector::FaceDetector,
    metrics::{MetricsCollector, TickMetrics, TickOutcome},
    models::FrameDetection,
    session::SessionAccumulator,
    video::{VideoFrame, VideoSource},
};

use super::LiveStatus;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_info, log_warn};

/// Everything one sampling loop reads from or writes to.
#[derive(Clone)]
pub struct SamplerContext {
    pub source: Arc<dyn VideoSource>,
    pub detector: Arc<dyn FaceDetector>,
    pub accumulator: SessionAccumulator,
    pub live_tx: watch::Sender<LiveStatus>,
    pub metrics: MetricsCollector,
}

struct DetectionRun {
    frame: VideoFrame,
    started: Instant,
    result: Result<Option<FrameDetection>>,
}

pub async fn sampling_loop(ctx: SamplerContext, interval: Duration, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: Option<JoinHandle<DetectionRun>> = None;

    loop {
        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                log_info!("sampling loop shutting down");
                break;
            }
            joined = wait_in_flight(&mut in_flight) => {
                in_flight = None;
                match joined {
                    Ok(run) => handle_detection(&ctx, run).await,
                    Err(err) => {
                        log_warn!("detection task ended abnormally: {err}");
                        record(&ctx.metrics, TickOutcome::Failed, None, false).await;
                    }
                }
            }
            _ = ticker.tick() => {
                if in_flight.is_some() {
                    record(&ctx.metrics, TickOutcome::Skipped, None, false).await;
                    continue;
                }

                let Some(frame) = ctx.source.current_frame() else {
                    continue;
                };

                let detector = Arc::clone(&ctx.detector);
                in_flight = Some(tokio::spawn(async move {
                    let started = Instant::now();
                    let result = detector.detect(&frame).await;
                    DetectionRun { frame, started, result }
                }));
            }
        }
    }

    // Any detection still running is left to finish on its own; nobody joins it.
    drop(in_flight);
}

async fn wait_in_flight(
    in_flight: &mut Option<JoinHandle<DetectionRun>>,
) -> Result<DetectionRun, JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn handle_detection(ctx: &SamplerContext, run: DetectionRun) {
    let detect_ms = run.started.elapsed().as_millis() as u64;

    match run.result {
        Ok(Some(detection)) => {
            let signals = extract_signals(&detection);
            let triple = to_samples(&detection, &signals, run.frame.captured_at);
            let recorded = ctx.accumulator.append(triple).await;

            ctx.live_tx.send_replace(LiveStatus::Face {
                at: run.frame.captured_at,
                signals,
            });
            record(&ctx.metrics, TickOutcome::Face, Some(detect_ms), recorded).await;
        }
        Ok(None) => {
            ctx.live_tx.send_replace(LiveStatus::NoFace {
                at: run.frame.captured_at,
            });
            record(&ctx.metrics, TickOutcome::NoFace, Some(detect_ms), false).await;
        }
        Err(err) => {
            log_debug!("detection failed after {detect_ms}ms: {err:#}");
            record(&ctx.metrics, TickOutcome::Failed, Some(detect_ms), false).await;
        }
    }
}

async fn record(metrics: &MetricsCollector, outcome: TickOutcome, detect_ms: Option<u64>, recorded: bool) {
    metrics
        .record_tick(TickMetrics {
            timestamp: Utc::now(),
            outcome,
            detect_ms,
            recorded,
        })
        .await;
}
