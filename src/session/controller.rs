use std::{sync::Arc, time::Instant};

use chrono::Utc;
use log::{info, warn};
use tokio::sync::{broadcast, Mutex};
use tokio::time::Duration;
use uuid::Uuid;

use crate::{
    capture::CaptureDevice,
    metrics::{HistoryBuffer, MetricsStore, Reading},
    sensing::{MetricsGenerator, SensingController},
};

use super::{SessionError, SessionEvent, SessionSnapshot, SessionState, SessionStatus};

/// Owns the active/inactive lifecycle: the sensing ticker, the capture device
/// and the reading history all follow it.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    store: MetricsStore,
    sensing: Arc<Mutex<SensingController>>,
    capture: Arc<Mutex<Box<dyn CaptureDevice>>>,
    events: broadcast::Sender<SessionEvent>,
    lifecycle: Arc<Mutex<()>>,
}

impl SessionController {
    pub fn new(
        capture: Box<dyn CaptureDevice>,
        generator: MetricsGenerator,
        history: HistoryBuffer,
        trend_window: usize,
        tick_interval: Duration,
        event_buffer: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            store: MetricsStore::new(history, trend_window),
            sensing: Arc::new(Mutex::new(SensingController::new(generator, tick_interval))),
            capture: Arc::new(Mutex::new(capture)),
            events,
            lifecycle: Arc::new(Mutex::new(())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.lock().await.status
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.is_active()
    }

    /// Latest reading, or `None` before the first session ever started.
    pub async fn current_reading(&self) -> Option<Reading> {
        self.store.current().await
    }

    pub async fn history(&self) -> HistoryBuffer {
        self.store.history().await
    }

    pub async fn trend(&self) -> Vec<Reading> {
        self.store.trend().await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let current = self.store.current().await;
        let mut guard = self.state.lock().await;
        guard.sync_active_from_anchor();
        SessionSnapshot {
            status: guard.status,
            session_id: guard.session_id.clone(),
            started_at: guard.started_at,
            active_ms: guard.active_ms,
            stream_unavailable: guard.stream_unavailable,
            current,
        }
    }

    pub async fn start_session(&self) -> Result<SessionSnapshot, SessionError> {
        let _lifecycle = self.lifecycle.lock().await;
        self.start_locked().await
    }

    pub async fn stop_session(&self) -> Result<SessionSnapshot, SessionError> {
        let _lifecycle = self.lifecycle.lock().await;
        self.stop_locked().await
    }

    pub async fn toggle_session(&self) -> Result<SessionSnapshot, SessionError> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.is_active().await {
            self.stop_locked().await
        } else {
            self.start_locked().await
        }
    }

    // Callers hold `lifecycle` so a start and a stop never interleave.
    async fn start_locked(&self) -> Result<SessionSnapshot, SessionError> {
        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        {
            let mut state = self.state.lock().await;
            if state.is_active() {
                return Err(SessionError::AlreadyActive);
            }
            state.begin_session(session_id.clone(), started_at, Instant::now());
        }

        self.store.reset_history().await;

        // Resume from the frozen reading; only the very first session starts from the seed.
        let start_from = match self.store.current().await {
            Some(reading) => reading,
            None => {
                let seed = Reading::seed(started_at);
                self.store.set_current(seed).await;
                seed
            }
        };

        let stream_unavailable = {
            let mut capture = self.capture.lock().await;
            match capture.open() {
                Ok(()) => false,
                Err(err) => {
                    warn!("capture unavailable for session {}: {}", session_id, err);
                    capture.release();
                    true
                }
            }
        };
        self.state.lock().await.stream_unavailable = stream_unavailable;

        let started = self.sensing.lock().await.start_sensing(
            session_id.clone(),
            start_from,
            self.store.clone(),
            self.events.clone(),
        );
        if let Err(err) = started {
            self.capture.lock().await.release();
            self.state.lock().await.stop();
            return Err(SessionError::SensingFailed(format!("{err:#}")));
        }

        info!("session {} started", session_id);

        let snapshot = self.snapshot().await;
        self.emit(SessionEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    async fn stop_locked(&self) -> Result<SessionSnapshot, SessionError> {
        let session_id = {
            let mut state = self.state.lock().await;
            if !state.is_active() {
                return Err(SessionError::NotActive);
            }
            state.stop();
            state.session_id.clone().unwrap_or_default()
        };

        let stopped = self.sensing.lock().await.stop_sensing().await;
        self.capture.lock().await.release();
        stopped.map_err(|err| SessionError::SensingFailed(format!("{err:#}")))?;

        info!("session {} stopped", session_id);

        let snapshot = self.snapshot().await;
        self.emit(SessionEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
