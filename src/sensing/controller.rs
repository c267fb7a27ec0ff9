use anyhow::{bail, Context, Result};
use log::{info, warn};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::metrics::{MetricsStore, Reading};
use crate::session::SessionEvent;

use super::generator::MetricsGenerator;
use super::loop_worker::sensing_loop;

pub struct SensingController {
    handle: Option<JoinHandle<MetricsGenerator>>,
    cancel_token: Option<CancellationToken>,
    generator: Option<MetricsGenerator>,
    tick_interval: Duration,
}

impl SensingController {
    pub fn new(generator: MetricsGenerator, tick_interval: Duration) -> Self {
        Self {
            handle: None,
            cancel_token: None,
            generator: Some(generator),
            tick_interval,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start_sensing(
        &mut self,
        session_id: String,
        start_from: Reading,
        store: MetricsStore,
        events: broadcast::Sender<SessionEvent>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("sensing already active");
        }

        let generator = self
            .generator
            .take()
            .unwrap_or_else(MetricsGenerator::from_entropy);

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sensing_loop(
            session_id,
            generator,
            start_from,
            store,
            events,
            self.tick_interval,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancel the loop and wait for it to exit. No reading is recorded after this returns.
    pub async fn stop_sensing(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        match handle.await.context("sensing loop task failed to join") {
            Ok(generator) => {
                self.generator = Some(generator);
                info!("sensing stopped");
                Ok(())
            }
            Err(err) => {
                warn!("sensing loop ended abnormally; a fresh generator will be used");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test(start_paused = true)]
    async fn no_reading_is_recorded_after_stop() {
        let store = MetricsStore::default();
        let (events, _rx) = broadcast::channel(16);
        let mut sensing = SensingController::new(MetricsGenerator::seeded(4), Duration::from_secs(1));

        sensing
            .start_sensing("s1".into(), Reading::seed(Utc::now()), store.clone(), events)
            .unwrap();
        assert!(sensing.is_running());

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        sensing.stop_sensing().await.unwrap();
        let recorded = store.history().await.len();
        assert_eq!(recorded, 3);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.history().await.len(), recorded);
        assert!(!sensing.is_running());
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let store = MetricsStore::default();
        let (events, _rx) = broadcast::channel(16);
        let mut sensing = SensingController::new(MetricsGenerator::seeded(4), Duration::from_secs(1));
        let seed = Reading::seed(Utc::now());

        sensing
            .start_sensing("a".into(), seed, store.clone(), events.clone())
            .unwrap();
        assert!(sensing
            .start_sensing("b".into(), seed, store, events)
            .is_err());
        sensing.stop_sensing().await.unwrap();
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let mut sensing = SensingController::new(MetricsGenerator::seeded(1), Duration::from_secs(1));
        sensing.stop_sensing().await.unwrap();
    }
}
