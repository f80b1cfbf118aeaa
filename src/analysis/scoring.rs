use serde::Serialize;

use crate::models::{Expression, SessionMetrics};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    Excellent,
    Good,
    NeedsImprovement,
    Low,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Excellent => "excellent",
            Tier::Good => "good",
            Tier::NeedsImprovement => "needsImprovement",
            Tier::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    CameraLook,
    Smile,
    Stability,
}

/// Per-metric banding: lower bounds for excellent / good / needs-improvement,
/// anything below the last is low. Plus the positive/warning highlight cutoffs.
struct Bands {
    excellent: u8,
    good: u8,
    needs_improvement: u8,
    labels: [&'static str; 4],
    highlight_at_or_above: u8,
    highlight_below: u8,
    positive: &'static str,
    warning: &'static str,
}

const CAMERA_LOOK_BANDS: Bands = Bands {
    excellent: 70,
    good: 50,
    needs_improvement: 30,
    labels: ["Excellent", "Good", "Needs improvement", "Needs much improvement"],
    highlight_at_or_above: 70,
    highlight_below: 50,
    positive: "Great eye contact with the camera",
    warning: "Look at the camera more often",
};

// Baseline smile rates run low, so the smile cutoffs sit well under the others.
const SMILE_BANDS: Bands = Bands {
    excellent: 30,
    good: 15,
    needs_improvement: 5,
    labels: ["Bright impression", "Moderate", "Slightly stiff", "Tense"],
    highlight_at_or_above: 20,
    highlight_below: 10,
    positive: "Kept a bright expression",
    warning: "Try a light smile",
};

const STABILITY_BANDS: Bands = Bands {
    excellent: 80,
    good: 60,
    needs_improvement: 40,
    labels: ["Stable", "Fair", "Frequent movement", "Unstable"],
    highlight_at_or_above: 70,
    highlight_below: 50,
    positive: "Steady posture",
    warning: "Keep your posture steady",
};

impl Metric {
    fn bands(&self) -> &'static Bands {
        match self {
            Metric::CameraLook => &CAMERA_LOOK_BANDS,
            Metric::Smile => &SMILE_BANDS,
            Metric::Stability => &STABILITY_BANDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TieredMetric {
    pub metric: Metric,
    pub value: u8,
    pub tier: Tier,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HighlightKind {
    Positive,
    Warning,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub metric: Metric,
    pub kind: HighlightKind,
    pub text: &'static str,
}

/// Display-ready view of a finished session.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoReport {
    pub camera_look: TieredMetric,
    pub smile: TieredMetric,
    pub stability: TieredMetric,
    pub highlights: Vec<Highlight>,
    pub dominant_expression: Option<Expression>,
    /// Category shares in fixed category order
    pub expression_distribution: Vec<(Expression, u8)>,
}

pub fn classify(metric: Metric, value: u8) -> TieredMetric {
    let bands = metric.bands();
    let tier = if value >= bands.excellent {
        Tier::Excellent
    } else if value >= bands.good {
        Tier::Good
    } else if value >= bands.needs_improvement {
        Tier::NeedsImprovement
    } else {
        Tier::Low
    };

    let label = match tier {
        Tier::Excellent => bands.labels[0],
        Tier::Good => bands.labels[1],
        Tier::NeedsImprovement => bands.labels[2],
        Tier::Low => bands.labels[3],
    };

    TieredMetric {
        metric,
        value,
        tier,
        label,
    }
}

/// Positive or warning statement for a metric outside its middle band.
pub fn highlight(metric: Metric, value: u8) -> Option<Highlight> {
    let bands = metric.bands();
    let (kind, text) = if value >= bands.highlight_at_or_above {
        (HighlightKind::Positive, bands.positive)
    } else if value < bands.highlight_below {
        (HighlightKind::Warning, bands.warning)
    } else {
        return None;
    };

    Some(Highlight { metric, kind, text })
}

pub fn highlights(metrics: &SessionMetrics) -> Vec<Highlight> {
    [
        (Metric::CameraLook, metrics.camera_look_ratio),
        (Metric::Smile, metrics.smile_ratio),
        (Metric::Stability, metrics.stability_score),
    ]
    .into_iter()
    .filter_map(|(metric, value)| highlight(metric, value))
    .collect()
}

/// Builds the report, or `None` when the camera never saw the candidate look
/// at it (a zero look ratio means there is nothing meaningful to show).
pub fn build_report(metrics: &SessionMetrics) -> Option<VideoReport> {
    if metrics.camera_look_ratio == 0 {
        return None;
    }

    Some(VideoReport {
        camera_look: classify(Metric::CameraLook, metrics.camera_look_ratio),
        smile: classify(Metric::Smile, metrics.smile_ratio),
        stability: classify(Metric::Stability, metrics.stability_score),
        highlights: highlights(metrics),
        dominant_expression: metrics.dominant_expression,
        expression_distribution: metrics
            .expression_distribution
            .iter()
            .map(|(e, v)| (*e, *v))
            .collect(),
    })
}
