use crate::models::{
    Expression, ExpressionSample, ExpressionScores, FrameDetection, GazeDirection,
    HeadPoseSample, Point, SampleTriple,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// |normalized nose offset| below this counts as looking at the camera.
pub const GAZE_CENTER_THRESHOLD: f64 = 0.15;

/// Eye distances (in pixels) at or below this are treated as degenerate.
const MIN_EYE_DISTANCE: f64 = 1e-6;

/// Live score above which the dominant expression is shown as confident.
const CONFIDENT_EXPRESSION_SCORE: f64 = 0.5;

/// Signals derived from a single detection.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameSignals {
    pub gaze: GazeDirection,
    pub head_pose: HeadPoseSample,
    /// Strongest expression in this frame, for live display only
    pub dominant_expression: Option<Expression>,
    pub dominant_score: f64,
}

impl FrameSignals {
    pub fn is_confident(&self) -> bool {
        self.dominant_score > CONFIDENT_EXPRESSION_SCORE
    }
}

pub fn extract_signals(detection: &FrameDetection) -> FrameSignals {
    let (dominant_expression, dominant_score) = match dominant_in_frame(&detection.expressions) {
        Some((expression, score)) => (Some(expression), score),
        None => (None, 0.0),
    };

    FrameSignals {
        gaze: estimate_gaze(detection),
        head_pose: HeadPoseSample {
            roll: estimate_roll(detection),
        },
        dominant_expression,
        dominant_score,
    }
}

/// Bundles the signals of one detection into the triple appended to a session.
pub fn to_samples(
    detection: &FrameDetection,
    signals: &FrameSignals,
    timestamp: DateTime<Utc>,
) -> SampleTriple {
    SampleTriple {
        expression: ExpressionSample {
            timestamp,
            expressions: detection.expressions.clone(),
        },
        gaze: signals.gaze,
        head_pose: signals.head_pose,
    }
}

/// Classifies horizontal gaze from where the nose tip sits between the eyes.
pub fn estimate_gaze(detection: &FrameDetection) -> GazeDirection {
    let (Some(nose_tip), Some(left_eye), Some(right_eye)) = (
        detection.nose_tip(),
        detection.left_eye(),
        detection.right_eye(),
    ) else {
        return GazeDirection::Unknown;
    };

    let (Some(left_center), Some(right_center)) = (centroid(left_eye), centroid(right_eye))
    else {
        return GazeDirection::Unknown;
    };

    let eye_distance = (right_center.x - left_center.x).abs();
    if eye_distance.is_nan() || eye_distance <= MIN_EYE_DISTANCE {
        return GazeDirection::Unknown;
    }

    let face_center_x = (left_center.x + right_center.x) / 2.0;
    let normalized_offset = (nose_tip.x - face_center_x) / eye_distance;

    if normalized_offset.abs() < GAZE_CENTER_THRESHOLD {
        GazeDirection::Center
    } else if normalized_offset > 0.0 {
        GazeDirection::Right
    } else {
        GazeDirection::Left
    }
}

/// Head roll in degrees from the slope of the outer eye-corner line.
/// Vertical corner lines (same x) and missing landmarks give 0.
pub fn estimate_roll(detection: &FrameDetection) -> f64 {
    let Some((left, right)) = detection.outer_eye_corners() else {
        return 0.0;
    };

    let dx = right.x - left.x;
    if dx.abs() < f64::EPSILON {
        return 0.0;
    }

    let roll = ((right.y - left.y) / dx).atan().to_degrees();
    if roll.is_finite() {
        roll
    } else {
        0.0
    }
}

/// Highest-scoring category of one frame; ties go to the earlier category.
pub fn dominant_in_frame(scores: &ExpressionScores) -> Option<(Expression, f64)> {
    if scores.is_empty() {
        return None;
    }

    let mut best: Option<(Expression, f64)> = None;
    for expression in Expression::ALL {
        let score = scores.get(expression);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((expression, score)),
        }
    }
    best
}

fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}
