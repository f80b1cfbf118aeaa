use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::FrameDetection;
use crate::settings::DetectorOptions;
use crate::video::VideoFrame;

use super::{DetectorProvider, FaceDetector};

/// One scripted detector answer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptStep {
    Face(FrameDetection),
    NoFace,
    Fail(String),
}

impl From<Option<FrameDetection>> for ScriptStep {
    fn from(value: Option<FrameDetection>) -> Self {
        match value {
            Some(detection) => ScriptStep::Face(detection),
            None => ScriptStep::NoFace,
        }
    }
}

/// Detector that replays a fixed sequence of answers, one per call.
///
/// Once the script runs out every call reports no face.
pub struct ScriptedDetector {
    steps: Mutex<VecDeque<ScriptStep>>,
    latency: Duration,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = ScriptStep>,
    {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Makes every call take `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn remaining(&self) -> usize {
        self.lock_steps().len()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock_steps(&self) -> MutexGuard<'_, VecDeque<ScriptStep>> {
        match self.steps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl FaceDetector for ScriptedDetector {
    async fn detect(&self, _frame: &VideoFrame) -> Result<Option<FrameDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.lock_steps().pop_front();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match step {
            Some(ScriptStep::Face(detection)) => Ok(Some(detection)),
            Some(ScriptStep::NoFace) | None => Ok(None),
            Some(ScriptStep::Fail(reason)) => Err(anyhow!(reason)),
        }
    }
}

/// Provider handing out a prepared [`ScriptedDetector`], or failing to load.
pub struct ScriptedProvider {
    detector: Option<Arc<ScriptedDetector>>,
    failure: String,
    load_latency: Duration,
}

impl ScriptedProvider {
    pub fn ready(detector: Arc<ScriptedDetector>) -> Self {
        Self {
            detector: Some(detector),
            failure: String::new(),
            load_latency: Duration::ZERO,
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            detector: None,
            failure: reason.into(),
            load_latency: Duration::ZERO,
        }
    }

    /// Makes `load` take `latency` before answering.
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }
}

#[async_trait]
impl DetectorProvider for ScriptedProvider {
    async fn load(&self, _options: &DetectorOptions) -> Result<Arc<dyn FaceDetector>> {
        if !self.load_latency.is_zero() {
            tokio::time::sleep(self.load_latency).await;
        }

        match &self.detector {
            Some(detector) => Ok(Arc::clone(detector) as Arc<dyn FaceDetector>),
            None => Err(anyhow!("face detector failed to load: {}", self.failure)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpressionScores, FaceBox};
    use image::RgbImage;

    fn frame() -> VideoFrame {
        VideoFrame::new(Arc::new(RgbImage::new(2, 2)))
    }

    fn detection() -> FrameDetection {
        FrameDetection {
            face_box: FaceBox { x: 0.0, y: 0.0, width: 1.0, height: 1.0, score: 0.9 },
            landmarks: Vec::new(),
            expressions: ExpressionScores::new(),
        }
    }

    #[tokio::test]
    async fn replays_script_in_order() {
        let detector = ScriptedDetector::new([
            ScriptStep::Face(detection()),
            ScriptStep::NoFace,
            ScriptStep::Fail("camera glitch".into()),
        ]);

        assert!(detector.detect(&frame()).await.unwrap().is_some());
        assert!(detector.detect(&frame()).await.unwrap().is_none());
        assert!(detector.detect(&frame()).await.is_err());
        assert!(detector.detect(&frame()).await.unwrap().is_none());
        assert_eq!(detector.calls(), 4);
        assert_eq!(detector.remaining(), 0);
    }

    #[tokio::test]
    async fn failing_provider_reports_reason() {
        let provider = ScriptedProvider::failing("model download blocked");
        let err = match provider.load(&DetectorOptions::default()).await {
            Ok(_) => panic!("expected load failure"),
            Err(err) => err,
        };
        assert!(err.to_string().contains("model download blocked"));
    }

    #[test]
    fn scenario_entries_convert_to_steps() {
        let entries: Vec<Option<FrameDetection>> = vec![Some(detection()), None];
        let steps: Vec<ScriptStep> = entries.into_iter().map(ScriptStep::from).collect();
        assert!(matches!(steps[0], ScriptStep::Face(_)));
        assert!(matches!(steps[1], ScriptStep::NoFace));
    }
}
