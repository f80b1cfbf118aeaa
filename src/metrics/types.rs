use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TickOutcome {
    Face,
    NoFace,
    Failed,
    /// Previous detection still in flight
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickMetrics {
    pub timestamp: DateTime<Utc>,
    pub outcome: TickOutcome,
    pub detect_ms: Option<u64>,
    /// Whether the samples landed in an active recording
    pub recorded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub system: SystemMetrics,
    pub recent_ticks: Vec<TickMetrics>,
    pub tick_count: u64,
    pub face_count: u64,
    pub no_face_count: u64,
    pub failure_count: u64,
    pub skipped_count: u64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            system: SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            },
            recent_ticks: Vec::new(),
            tick_count: 0,
            face_count: 0,
            no_face_count: 0,
            failure_count: 0,
            skipped_count: 0,
        }
    }
}
