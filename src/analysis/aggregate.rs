use std::collections::BTreeMap;

use crate::models::{Expression, ExpressionSample, GazeDirection, HeadPoseSample, SessionMetrics};
use crate::session::SessionBuffer;

/// Stability reported when there are too few head poses to measure jitter.
pub const DEFAULT_STABILITY_SCORE: u8 = 80;

/// Stability points lost per degree of average frame-to-frame roll change.
const STABILITY_PENALTY_PER_DEGREE: f64 = 5.0;

/// Reduce a finished session buffer into normalized metrics.
///
/// Pure function of the buffer contents: calling it twice on the same buffer
/// yields the same metrics, and an empty buffer yields the documented defaults.
pub fn aggregate_session(buffer: &SessionBuffer) -> SessionMetrics {
    let expression_distribution = expression_distribution(buffer.expression_samples());
    let dominant_expression = if buffer.is_empty() {
        None
    } else {
        dominant_expression(&expression_distribution)
    };
    let smile_ratio = expression_distribution
        .get(&Expression::Happy)
        .copied()
        .unwrap_or(0);

    SessionMetrics {
        camera_look_ratio: camera_look_ratio(buffer.gaze_samples()),
        expression_distribution,
        dominant_expression,
        smile_ratio,
        stability_score: stability_score(buffer.head_pose_samples()),
    }
}

/// Percentage of gaze samples looking at the camera.
fn camera_look_ratio(gaze: &[GazeDirection]) -> u8 {
    if gaze.is_empty() {
        return 0;
    }
    let center = gaze.iter().filter(|g| g.is_center()).count();
    to_percent(center as f64 / gaze.len() as f64)
}

/// Mean score per category as a rounded percentage. Always has every category.
fn expression_distribution(samples: &[ExpressionSample]) -> BTreeMap<Expression, u8> {
    let mut totals: BTreeMap<Expression, f64> =
        Expression::ALL.iter().map(|e| (*e, 0.0)).collect();

    for sample in samples {
        for (expression, total) in totals.iter_mut() {
            *total += sample.expressions.get(*expression);
        }
    }

    let count = samples.len();
    totals
        .into_iter()
        .map(|(expression, total)| {
            let percent = if count == 0 {
                0
            } else {
                to_percent(total / count as f64)
            };
            (expression, percent)
        })
        .collect()
}

/// Category with the highest share; ties go to the earlier category.
fn dominant_expression(distribution: &BTreeMap<Expression, u8>) -> Option<Expression> {
    let mut best: Option<(Expression, u8)> = None;
    for expression in Expression::ALL {
        let value = distribution.get(&expression).copied().unwrap_or(0);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((expression, value)),
        }
    }
    best.map(|(expression, _)| expression)
}

/// 100 minus a penalty for average frame-to-frame roll jitter.
fn stability_score(poses: &[HeadPoseSample]) -> u8 {
    if poses.len() < 2 {
        return DEFAULT_STABILITY_SCORE;
    }

    let total_change: f64 = poses
        .windows(2)
        .map(|pair| (pair[1].roll - pair[0].roll).abs())
        .sum();
    let avg_change = total_change / (poses.len() - 1) as f64;

    let score = (100.0 - avg_change * STABILITY_PENALTY_PER_DEGREE).round();
    clamp_percent(score)
}

fn to_percent(fraction: f64) -> u8 {
    clamp_percent((fraction * 100.0).round())
}

fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0) as u8
}
