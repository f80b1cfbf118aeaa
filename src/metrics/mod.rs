mod types;

pub use types::{MetricsSnapshot, SystemMetrics, TickMetrics, TickOutcome};

use std::sync::Arc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::Mutex;

const MAX_RECENT_TICKS: usize = 20;

/// Sampler telemetry: tick outcome counters, the latest ticks and process load.
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_ticks: Vec<TickMetrics>,
    tick_count: u64,
    face_count: u64,
    no_face_count: u64,
    failure_count: u64,
    skipped_count: u64,
    system: System,
    pid: Pid,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // Initial refresh to establish baseline for CPU calculation
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_ticks: Vec::with_capacity(MAX_RECENT_TICKS),
                tick_count: 0,
                face_count: 0,
                no_face_count: 0,
                failure_count: 0,
                skipped_count: 0,
                system,
                pid,
            })),
        }
    }

    pub async fn record_tick(&self, tick: TickMetrics) {
        let mut state = self.inner.lock().await;

        state.tick_count += 1;
        match tick.outcome {
            TickOutcome::Face => state.face_count += 1,
            TickOutcome::NoFace => state.no_face_count += 1,
            TickOutcome::Failed => state.failure_count += 1,
            TickOutcome::Skipped => state.skipped_count += 1,
        }

        state.recent_ticks.push(tick);
        if state.recent_ticks.len() > MAX_RECENT_TICKS {
            state.recent_ticks.remove(0);
        }
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let mut state = self.inner.lock().await;
        let pid = state.pid;

        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        let system_metrics = if let Some(process) = state.system.process(pid) {
            SystemMetrics {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            }
        } else {
            SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            }
        };

        MetricsSnapshot {
            system: system_metrics,
            recent_ticks: state.recent_ticks.clone(),
            tick_count: state.tick_count,
            face_count: state.face_count,
            no_face_count: state.no_face_count,
            failure_count: state.failure_count,
            skipped_count: state.skipped_count,
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.recent_ticks.clear();
        state.tick_count = 0;
        state.face_count = 0;
        state.no_face_count = 0;
        state.failure_count = 0;
        state.skipped_count = 0;
        // Re-establish baseline for CPU after reset
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
