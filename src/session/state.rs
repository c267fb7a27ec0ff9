use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::metrics::Reading;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    /// No session has ever been started.
    #[default]
    Idle,
    Active,
    /// Generator halted; last reading and history are frozen.
    Stopped,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub active_ms: u64,
    pub stream_unavailable: bool,
    /// Time accumulated from earlier active windows; combines with `running_anchor`
    /// to compute the true active duration.
    active_ms_baseline: u64,
    running_anchor: Option<Instant>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn current_active_ms(&self) -> u64 {
        match (self.status, self.running_anchor) {
            (SessionStatus::Active, Some(anchor)) => self
                .active_ms_baseline
                .saturating_add(anchor.elapsed().as_millis() as u64),
            _ => self.active_ms,
        }
    }

    pub fn sync_active_from_anchor(&mut self) {
        self.active_ms = self.current_active_ms();
    }

    /// Each session counts its own active time; a restart begins at zero.
    pub fn begin_session(&mut self, session_id: String, start_at: DateTime<Utc>, now: Instant) {
        *self = Self {
            status: SessionStatus::Active,
            session_id: Some(session_id),
            started_at: Some(start_at),
            active_ms: 0,
            stream_unavailable: false,
            active_ms_baseline: 0,
            running_anchor: Some(now),
        };
    }

    pub fn stop(&mut self) {
        self.sync_active_from_anchor();
        self.status = SessionStatus::Stopped;
        self.running_anchor = None;
        self.active_ms_baseline = self.active_ms;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub active_ms: u64,
    pub stream_unavailable: bool,
    pub current: Option<Reading>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum SessionEvent {
    StateChanged(SessionSnapshot),
    Reading(Reading),
}
