use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::detection::ExpressionScores;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionSample {
    pub timestamp: DateTime<Utc>,
    pub expressions: ExpressionScores,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GazeDirection {
    Center,
    Left,
    Right,
    /// Degenerate geometry: eyes on top of each other or landmarks missing
    Unknown,
}

impl GazeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            GazeDirection::Center => "center",
            GazeDirection::Left => "left",
            GazeDirection::Right => "right",
            GazeDirection::Unknown => "unknown",
        }
    }

    pub fn is_center(&self) -> bool {
        matches!(self, GazeDirection::Center)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeadPoseSample {
    /// Head tilt about the viewing axis, degrees
    pub roll: f64,
}

/// The three samples produced by one successful detection.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTriple {
    pub expression: ExpressionSample,
    pub gaze: GazeDirection,
    pub head_pose: HeadPoseSample,
}
