//! Face detection capability.
//!
//! The landmark/expression model itself is external. The pipeline sees it
//! through [`FaceDetector`], obtained once from a [`DetectorProvider`]; a
//! provider that fails to load leaves the capability [`CapabilityState::Unavailable`]
//! and recordings fall back to audio-only.

pub mod scripted;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::FrameDetection;
use crate::settings::DetectorOptions;
use crate::video::VideoFrame;

pub use scripted::{ScriptStep, ScriptedDetector, ScriptedProvider};

#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Looks for a single face. `Ok(None)` means the frame had no face.
    async fn detect(&self, frame: &VideoFrame) -> Result<Option<FrameDetection>>;
}

#[async_trait]
pub trait DetectorProvider: Send + Sync {
    async fn load(&self, options: &DetectorOptions) -> Result<Arc<dyn FaceDetector>>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CapabilityState {
    NotLoaded,
    Ready,
    Unavailable { reason: String },
}

impl Default for CapabilityState {
    fn default() -> Self {
        CapabilityState::NotLoaded
    }
}

impl CapabilityState {
    pub fn is_ready(&self) -> bool {
        matches!(self, CapabilityState::Ready)
    }
}
