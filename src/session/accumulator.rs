use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::models::SampleTriple;

use super::state::{RecordingStatus, SessionBuffer, SessionState};

/// Snapshot of a recording at the moment it stopped.
#[derive(Debug, Clone)]
pub struct FinishedSession {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub buffer: SessionBuffer,
}

/// Shared handle to the current recording's state.
///
/// The recording controller owns the lifecycle (begin / finish / reset); the
/// sampling loop only ever calls [`SessionAccumulator::append`]. All of them go
/// through the same lock, so a tick that lands after `finish` sees a stopped
/// session and is dropped.
#[derive(Clone, Default)]
pub struct SessionAccumulator {
    state: Arc<Mutex<SessionState>>,
}

impl SessionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn begin(&self, session_id: String, started_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.is_recording() {
            bail!("recording already active");
        }
        state.begin(session_id, started_at);
        Ok(())
    }

    /// Appends one detection's samples. Returns `false` (and changes nothing)
    /// when no recording is active.
    pub async fn append(&self, triple: SampleTriple) -> bool {
        let mut state = self.state.lock().await;
        if !state.is_recording() {
            return false;
        }
        state.buffer.push(triple);
        true
    }

    /// Marks the recording stopped and returns its samples. `None` if nothing
    /// was recording.
    pub async fn finish(&self, stopped_at: DateTime<Utc>) -> Option<FinishedSession> {
        let mut state = self.state.lock().await;
        if !state.is_recording() {
            return None;
        }
        state.stop(stopped_at);

        Some(FinishedSession {
            session_id: state.session_id.clone()?,
            started_at: state.started_at.unwrap_or(stopped_at),
            stopped_at,
            buffer: state.buffer.clone(),
        })
    }

    /// Drops every collected sample and returns to idle.
    pub async fn reset(&self) {
        self.state.lock().await.reset();
    }

    pub async fn status(&self) -> RecordingStatus {
        self.state.lock().await.status
    }

    pub async fn sample_count(&self) -> usize {
        self.state.lock().await.buffer.len()
    }

    pub async fn buffer(&self) -> SessionBuffer {
        self.state.lock().await.buffer.clone()
    }
}
