pub mod history;
pub mod panel;
mod types;

pub use history::{HistoryBuffer, HISTORY_CAPACITY, TREND_WINDOW};
pub use types::{Emotion, FaceEmotion, Reading};
pub use types::{
    BLINK_MAX, BLINK_MIN, FACE_SCORE_MAX, FACE_SCORE_MIN, PERCENT_MAX, PERCENT_MIN, VOICE_MAX,
    VOICE_MIN,
};

use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared current reading plus its trailing history.
pub struct MetricsStore {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    current: Option<Reading>,
    history: HistoryBuffer,
    trend_window: usize,
}

impl MetricsStore {
    pub fn new(history: HistoryBuffer, trend_window: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                current: None,
                history,
                trend_window,
            })),
        }
    }

    /// Store a freshly generated reading as current and append it to history.
    pub async fn record(&self, reading: Reading) {
        let mut state = self.inner.lock().await;
        state.current = Some(reading);
        state.history.append(reading);
    }

    /// Set the current reading without touching history.
    pub async fn set_current(&self, reading: Reading) {
        self.inner.lock().await.current = Some(reading);
    }

    pub async fn current(&self) -> Option<Reading> {
        self.inner.lock().await.current
    }

    pub async fn history(&self) -> HistoryBuffer {
        self.inner.lock().await.history.clone()
    }

    pub async fn trend(&self) -> Vec<Reading> {
        let state = self.inner.lock().await;
        state.history.window(state.trend_window).copied().collect()
    }

    pub async fn reset_history(&self) {
        self.inner.lock().await.history.clear();
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(HistoryBuffer::default(), TREND_WINDOW)
    }
}

impl Clone for MetricsStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
