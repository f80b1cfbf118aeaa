use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::detection::Expression;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisMode {
    Audio,
    Video,
}

impl Default for AnalysisMode {
    fn default() -> Self {
        AnalysisMode::Audio
    }
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Audio => "audio",
            AnalysisMode::Video => "video",
        }
    }
}

/// Normalized behavioral metrics for one finished recording.
///
/// Every percentage is in 0..=100 regardless of how many samples were
/// collected; `expression_distribution` always carries all seven categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub camera_look_ratio: u8,
    pub expression_distribution: BTreeMap<Expression, u8>,
    pub dominant_expression: Option<Expression>,
    pub smile_ratio: u8,
    pub stability_score: u8,
}

/// What a stopped recording hands to the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRecording {
    pub session_id: String,
    pub mode: AnalysisMode,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub sample_count: usize,
    /// Present only for video-mode recordings with a working detector
    pub video_analysis: Option<SessionMetrics>,
}
