use anyhow::{bail, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::loop_worker::{sampling_loop, SamplerContext};
use super::LiveStatus;

/// Owns the sampling task: at most one loop runs at a time.
pub struct SamplerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    live_reset: Option<tokio::sync::watch::Sender<LiveStatus>>,
}

impl SamplerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            live_reset: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self, ctx: SamplerContext, interval: Duration) -> Result<()> {
        if self.handle.is_some() {
            bail!("sampler already active");
        }
        if !ctx.source.is_active() {
            bail!("video source is not active");
        }

        info!("Starting face sampler every {}ms", interval.as_millis());

        let cancel_token = CancellationToken::new();
        let live_reset = ctx.live_tx.clone();
        let handle = tokio::spawn(sampling_loop(ctx, interval, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.live_reset = Some(live_reset);
        Ok(())
    }

    /// Stops ticking immediately. A detection already dispatched is not waited
    /// for; its result is dropped. Calling this on a stopped sampler is a no-op.
    pub fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Face sampler stopped");
        }

        if let Some(live) = self.live_reset.take() {
            live.send_replace(LiveStatus::Idle);
        }
    }
}

impl Default for SamplerController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SamplerController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{ScriptStep, ScriptedDetector};
    use crate::metrics::MetricsCollector;
    use crate::models::{Expression, ExpressionScores, FaceBox, FrameDetection, Point};
    use crate::session::SessionAccumulator;
    use crate::video::{StaticVideoSource, VideoSource};
    use chrono::Utc;
    use image::RgbImage;
    use std::sync::Arc;
    use tokio::sync::watch;

    const INTERVAL: Duration = Duration::from_millis(200);

    fn centered_face() -> FrameDetection {
        let mut landmarks = vec![Point::new(0.0, 0.0); 68];
        for i in 36..42 {
            landmarks[i] = Point::new(100.0, 100.0);
        }
        for i in 42..48 {
            landmarks[i] = Point::new(160.0, 100.0);
        }
        landmarks[30] = Point::new(130.0, 140.0);
        FrameDetection {
            face_box: FaceBox { x: 80.0, y: 60.0, width: 120.0, height: 140.0, score: 0.9 },
            landmarks,
            expressions: ExpressionScores::new().with(Expression::Happy, 0.9),
        }
    }

    struct Harness {
        source: Arc<StaticVideoSource>,
        detector: Arc<ScriptedDetector>,
        accumulator: SessionAccumulator,
        live_rx: watch::Receiver<LiveStatus>,
        metrics: MetricsCollector,
        ctx: SamplerContext,
    }

    fn harness(detector: ScriptedDetector) -> Harness {
        let source = Arc::new(StaticVideoSource::new(RgbImage::new(4, 4)));
        let detector = Arc::new(detector);
        let accumulator = SessionAccumulator::new();
        let (live_tx, live_rx) = watch::channel(LiveStatus::Idle);
        let metrics = MetricsCollector::new();
        let ctx = SamplerContext {
            source: Arc::clone(&source) as Arc<dyn VideoSource>,
            detector: Arc::clone(&detector) as Arc<dyn crate::detector::FaceDetector>,
            accumulator: accumulator.clone(),
            live_tx,
            metrics: metrics.clone(),
        };
        Harness {
            source,
            detector,
            accumulator,
            live_rx,
            metrics,
            ctx,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn faces_reach_accumulator_only_while_recording() {
        let h = harness(ScriptedDetector::new(
            (0..10).map(|_| ScriptStep::Face(centered_face())),
        ));
        let mut sampler = SamplerController::new();
        sampler.start(h.ctx.clone(), INTERVAL).unwrap();

        // Not recording yet: detections run but nothing is stored
        tokio::time::sleep(Duration::from_millis(450)).await;
        assert!(h.detector.calls() > 0);
        assert_eq!(h.accumulator.sample_count().await, 0);

        h.accumulator.begin("s1".into(), Utc::now()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(650)).await;
        let recorded = h.accumulator.sample_count().await;
        assert!(recorded >= 2, "recorded {recorded}");

        let buffer = h.accumulator.buffer().await;
        assert_eq!(buffer.gaze_samples().len(), recorded);
        assert_eq!(buffer.head_pose_samples().len(), recorded);

        match &*h.live_rx.borrow() {
            LiveStatus::Face { signals, .. } => {
                assert_eq!(signals.dominant_expression, Some(Expression::Happy));
                assert!(signals.gaze.is_center());
            }
            other => panic!("unexpected live status {other:?}"),
        }

        sampler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn no_face_ticks_update_live_status_only() {
        let h = harness(ScriptedDetector::new([ScriptStep::NoFace, ScriptStep::NoFace]));
        h.accumulator.begin("s1".into(), Utc::now()).await.unwrap();

        let mut sampler = SamplerController::new();
        sampler.start(h.ctx.clone(), INTERVAL).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(matches!(*h.live_rx.borrow(), LiveStatus::NoFace { .. }));
        assert_eq!(h.accumulator.sample_count().await, 0);
        assert!(h.metrics.get_snapshot().await.no_face_count >= 1);
        sampler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn detector_errors_do_not_stop_the_loop() {
        let h = harness(ScriptedDetector::new([
            ScriptStep::Fail("backend hiccup".into()),
            ScriptStep::Fail("backend hiccup".into()),
            ScriptStep::Face(centered_face()),
        ]));
        h.accumulator.begin("s1".into(), Utc::now()).await.unwrap();

        let mut sampler = SamplerController::new();
        sampler.start(h.ctx.clone(), INTERVAL).unwrap();
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        assert!(sampler.is_running());
        assert_eq!(h.accumulator.sample_count().await, 1);
        assert_eq!(h.metrics.get_snapshot().await.failure_count, 2);
        sampler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_detections_skip_ticks_instead_of_overlapping() {
        let h = harness(
            ScriptedDetector::new((0..20).map(|_| ScriptStep::Face(centered_face())))
                .with_latency(Duration::from_millis(500)),
        );
        let mut sampler = SamplerController::new();
        sampler.start(h.ctx.clone(), INTERVAL).unwrap();
        tokio::time::sleep(Duration::from_millis(2_050)).await;
        sampler.stop();

        let snapshot = h.metrics.get_snapshot().await;
        assert!(snapshot.skipped_count > 0);
        // ~11 ticks in 2s but each detection spans 3 ticks
        assert!(h.detector.calls() <= 5, "calls {}", h.detector.calls());
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_source_emits_nothing() {
        let h = harness(ScriptedDetector::new([ScriptStep::Face(centered_face())]));
        let mut sampler = SamplerController::new();
        sampler.start(h.ctx.clone(), INTERVAL).unwrap();
        h.source.set_active(false);
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        assert_eq!(h.detector.calls(), 0);
        assert_eq!(*h.live_rx.borrow(), LiveStatus::Idle);
        sampler.stop();
    }

    #[tokio::test]
    async fn refuses_inactive_source_and_double_start() {
        let h = harness(ScriptedDetector::new([]));
        let mut sampler = SamplerController::new();

        h.source.set_active(false);
        assert!(sampler.start(h.ctx.clone(), INTERVAL).is_err());

        h.source.set_active(true);
        sampler.start(h.ctx.clone(), INTERVAL).unwrap();
        assert!(sampler.start(h.ctx.clone(), INTERVAL).is_err());
        sampler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_discards_in_flight_result() {
        let h = harness(
            ScriptedDetector::new([ScriptStep::Face(centered_face())])
                .with_latency(Duration::from_millis(300)),
        );
        h.accumulator.begin("s1".into(), Utc::now()).await.unwrap();

        let mut sampler = SamplerController::new();
        sampler.start(h.ctx.clone(), INTERVAL).unwrap();
        // First tick fires immediately; its detection is still running at 100ms
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.detector.calls(), 1);

        sampler.stop();
        sampler.stop();
        assert!(!sampler.is_running());

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(h.detector.calls(), 1);
        assert_eq!(h.accumulator.sample_count().await, 0);
        assert_eq!(*h.live_rx.borrow(), LiveStatus::Idle);
    }
}
