use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::metrics::{MetricsStore, Reading};
use crate::session::SessionEvent;

use super::generator::MetricsGenerator;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Emits one reading per tick until cancelled. Hands the generator back so the
/// next session continues the same random stream.
pub async fn sensing_loop(
    session_id: String,
    mut generator: MetricsGenerator,
    start_from: Reading,
    store: MetricsStore,
    events: broadcast::Sender<SessionEvent>,
    tick_interval: Duration,
    cancel_token: CancellationToken,
) -> MetricsGenerator {
    let mut ticker = tokio::time::interval_at(Instant::now() + tick_interval, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last = start_from;
    let mut ticks: u64 = 0;

    log_info!("sensing loop started for session {}", session_id);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("sensing loop shutting down after {} ticks", ticks);
                break;
            }
            _ = ticker.tick() => {
                let reading = generator.next_reading(&last, Utc::now());
                store.record(reading).await;
                last = reading;
                ticks = ticks.wrapping_add(1);

                log_debug!(
                    "tick {} session {}: {} ({:.2}) engagement={:.1} confusion={:.1}",
                    ticks,
                    session_id,
                    reading.face_emotion.emotion,
                    reading.face_emotion.score,
                    reading.engagement_score,
                    reading.confusion_level
                );

                // No receivers is fine; the store still holds the reading.
                let _ = events.send(SessionEvent::Reading(reading));
            }
        }
    }

    generator
}
