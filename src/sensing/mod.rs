pub mod controller;
pub mod loop_worker;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::FrameSignals;

pub use controller::SamplerController;
pub use loop_worker::SamplerContext;

/// What the live preview should show after the latest tick.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LiveStatus {
    /// Sampler not running
    Idle,
    NoFace {
        at: DateTime<Utc>,
    },
    Face {
        at: DateTime<Utc>,
        signals: FrameSignals,
    },
}

impl LiveStatus {
    /// True when the latest tick saw a face looking at the camera.
    pub fn on_camera(&self) -> bool {
        matches!(self, LiveStatus::Face { signals, .. } if signals.gaze.is_center())
    }
}
