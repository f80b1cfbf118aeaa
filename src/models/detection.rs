//! Detector output data model.
//!
//! A `FrameDetection` is what the face detector hands back for one video frame:
//! a bounding box, the 68-point landmark layout and per-category expression scores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Landmark count of the 68-point face layout.
pub const LANDMARK_COUNT: usize = 68;

const NOSE_TIP: usize = 30;
const LEFT_EYE: std::ops::Range<usize> = 36..42;
const RIGHT_EYE: std::ops::Range<usize> = 42..48;
const LEFT_EYE_OUTER_CORNER: usize = 36;
const RIGHT_EYE_OUTER_CORNER: usize = 45;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Detector confidence for the face itself (0-1)
    #[serde(default)]
    pub score: f64,
}

/// Expression categories in fixed priority order.
///
/// Declaration order doubles as the tie-break order: when two categories score
/// the same, the one declared first wins. `Ord` follows the same order, so a
/// `BTreeMap<Expression, _>` iterates in priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Expression {
    pub const ALL: [Expression; 7] = [
        Expression::Neutral,
        Expression::Happy,
        Expression::Sad,
        Expression::Angry,
        Expression::Fearful,
        Expression::Disgusted,
        Expression::Surprised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Expression::Neutral => "neutral",
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Angry => "angry",
            Expression::Fearful => "fearful",
            Expression::Disgusted => "disgusted",
            Expression::Surprised => "surprised",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

/// Per-category expression confidence for one frame.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ExpressionScores(BTreeMap<Expression, f64>);

impl ExpressionScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds scores from detector category names, dropping names outside the
    /// known category set.
    pub fn from_named<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let scores = entries
            .into_iter()
            .filter_map(|(name, score)| Expression::from_name(name).map(|e| (e, score)))
            .collect();
        Self(scores)
    }

    pub fn with(mut self, expression: Expression, score: f64) -> Self {
        self.0.insert(expression, score);
        self
    }

    /// Score for a category; categories the detector did not report count as 0.
    pub fn get(&self, expression: Expression) -> f64 {
        self.0.get(&expression).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Expression, f64)> + '_ {
        self.0.iter().map(|(e, s)| (*e, *s))
    }
}

impl<'de> Deserialize<'de> for ExpressionScores {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: BTreeMap<String, f64> = BTreeMap::deserialize(deserializer)?;
        Ok(Self::from_named(raw.iter().map(|(k, v)| (k.as_str(), *v))))
    }
}

/// One face found by the detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameDetection {
    #[serde(rename = "box")]
    pub face_box: FaceBox,
    pub landmarks: Vec<Point>,
    pub expressions: ExpressionScores,
}

impl FrameDetection {
    pub fn nose_tip(&self) -> Option<Point> {
        self.landmarks.get(NOSE_TIP).copied()
    }

    pub fn left_eye(&self) -> Option<&[Point]> {
        self.landmarks.get(LEFT_EYE)
    }

    pub fn right_eye(&self) -> Option<&[Point]> {
        self.landmarks.get(RIGHT_EYE)
    }

    /// Outer corners of the left and right eye, in that order.
    pub fn outer_eye_corners(&self) -> Option<(Point, Point)> {
        let left = self.landmarks.get(LEFT_EYE_OUTER_CORNER)?;
        let right = self.landmarks.get(RIGHT_EYE_OUTER_CORNER)?;
        Some((*left, *right))
    }
}
