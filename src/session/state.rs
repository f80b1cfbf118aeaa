use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ExpressionSample, GazeDirection, HeadPoseSample, SampleTriple};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RecordingStatus {
    Idle,
    Recording,
    Stopped,
}

impl Default for RecordingStatus {
    fn default() -> Self {
        RecordingStatus::Idle
    }
}

/// Samples collected during one recording.
///
/// The three sequences only grow together through [`SessionBuffer::push`], so
/// they always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionBuffer {
    expressions: Vec<ExpressionSample>,
    gaze: Vec<GazeDirection>,
    head_poses: Vec<HeadPoseSample>,
}

impl SessionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, triple: SampleTriple) {
        self.expressions.push(triple.expression);
        self.gaze.push(triple.gaze);
        self.head_poses.push(triple.head_pose);
    }

    pub fn clear(&mut self) {
        self.expressions.clear();
        self.gaze.clear();
        self.head_poses.clear();
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn expression_samples(&self) -> &[ExpressionSample] {
        &self.expressions
    }

    pub fn gaze_samples(&self) -> &[GazeDirection] {
        &self.gaze
    }

    pub fn head_pose_samples(&self) -> &[HeadPoseSample] {
        &self.head_poses
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub status: RecordingStatus,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub buffer: SessionBuffer,
}

impl SessionState {
    pub fn is_recording(&self) -> bool {
        self.status == RecordingStatus::Recording
    }

    pub fn begin(&mut self, session_id: String, started_at: DateTime<Utc>) {
        *self = Self {
            status: RecordingStatus::Recording,
            session_id: Some(session_id),
            started_at: Some(started_at),
            stopped_at: None,
            buffer: SessionBuffer::new(),
        };
    }

    pub fn stop(&mut self, stopped_at: DateTime<Utc>) {
        self.status = RecordingStatus::Stopped;
        self.stopped_at = Some(stopped_at);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
