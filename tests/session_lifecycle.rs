use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use chrono::Utc;
use emotutor_lib::capture::{CaptureDevice, CaptureError, UnavailableCamera};
use emotutor_lib::metrics::Reading;
use emotutor_lib::sensing::MetricsGenerator;
use emotutor_lib::session::{SessionError, SessionEvent, SessionStatus};
use emotutor_lib::settings::AppConfig;
use emotutor_lib::App;

#[derive(Clone, Default)]
struct CountingCamera {
    opens: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
    open: Arc<AtomicBool>,
}

impl CaptureDevice for CountingCamera {
    fn open(&mut self) -> Result<(), CaptureError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

fn app_with(camera: Box<dyn CaptureDevice>, seed: u64) -> App {
    App::with_generator(AppConfig::default(), camera, MetricsGenerator::seeded(seed)).unwrap()
}

fn same_values(a: &Reading, b: &Reading) -> bool {
    a.face_emotion == b.face_emotion
        && a.voice_emotion_score == b.voice_emotion_score
        && a.engagement_score == b.engagement_score
        && a.confusion_level == b.confusion_level
        && a.blink_rate == b.blink_rate
}

#[tokio::test(start_paused = true)]
async fn session_ticks_once_per_second_and_freezes_on_stop() {
    let camera = CountingCamera::default();
    let app = app_with(Box::new(camera.clone()), 7);
    let session = app.session();

    assert_eq!(session.status().await, SessionStatus::Idle);
    assert!(session.current_reading().await.is_none());

    let started = session.start_session().await.unwrap();
    assert_eq!(started.status, SessionStatus::Active);
    assert!(!started.stream_unavailable);
    assert!(camera.open.load(Ordering::SeqCst));

    tokio::time::sleep(Duration::from_millis(5_500)).await;
    assert_eq!(session.history().await.len(), 5);

    let stopped = session.stop_session().await.unwrap();
    assert_eq!(stopped.status, SessionStatus::Stopped);
    assert_eq!(camera.releases.load(Ordering::SeqCst), 1);
    assert!(!camera.open.load(Ordering::SeqCst));

    let frozen = session.current_reading().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(session.history().await.len(), 5);
    assert_eq!(session.current_reading().await.unwrap(), frozen);
}

#[tokio::test(start_paused = true)]
async fn first_session_starts_from_seed_and_restart_resumes_from_frozen_reading() {
    let app = app_with(Box::new(CountingCamera::default()), 42);
    let session = app.session();
    let mut replica = MetricsGenerator::seeded(42);

    session.start_session().await.unwrap();
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    session.stop_session().await.unwrap();

    let history = session.history().await.to_vec();
    let mut expected = Reading::seed(Utc::now());
    for reading in &history {
        expected = replica.next_reading(&expected, Utc::now());
        assert!(same_values(reading, &expected));
    }

    session.start_session().await.unwrap();
    assert!(session.history().await.is_empty(), "history clears on start");

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let resumed = session.history().await.to_vec();
    assert_eq!(resumed.len(), 1);
    let expected = replica.next_reading(&expected, Utc::now());
    assert!(same_values(&resumed[0], &expected));
    session.stop_session().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn history_is_capped_and_trend_is_its_tail() {
    let app = app_with(Box::new(CountingCamera::default()), 3);
    let session = app.session();

    session.start_session().await.unwrap();
    tokio::time::sleep(Duration::from_millis(64_500)).await;
    session.stop_session().await.unwrap();

    let history = session.history().await;
    assert_eq!(history.len(), 50);
    let trend = session.trend().await;
    assert_eq!(trend.len(), 30);
    assert_eq!(trend.as_slice(), &history.to_vec()[20..]);
    assert_eq!(history.latest(), session.current_reading().await.as_ref());
}

#[tokio::test(start_paused = true)]
async fn denied_camera_still_runs_the_generator() {
    let app = app_with(
        Box::new(UnavailableCamera::new(CaptureError::PermissionDenied)),
        5,
    );
    let session = app.session();

    let snapshot = session.start_session().await.unwrap();
    assert!(snapshot.stream_unavailable);

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(session.history().await.len(), 2);
    session.stop_session().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_state_changes_and_readings() {
    let app = app_with(Box::new(CountingCamera::default()), 11);
    let session = app.session();
    let mut events = session.subscribe();

    session.toggle_session().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    session.toggle_session().await.unwrap();

    let mut states = Vec::new();
    let mut readings = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::StateChanged(snapshot) => states.push(snapshot.status),
            SessionEvent::Reading(_) => readings += 1,
        }
    }
    assert_eq!(states, vec![SessionStatus::Active, SessionStatus::Stopped]);
    assert_eq!(readings, 2);
}

#[tokio::test]
async fn lifecycle_misuse_is_reported() {
    let app = app_with(Box::new(CountingCamera::default()), 1);
    let session = app.session();

    assert_eq!(session.stop_session().await.unwrap_err(), SessionError::NotActive);
    session.start_session().await.unwrap();
    assert_eq!(session.start_session().await.unwrap_err(), SessionError::AlreadyActive);
    assert_eq!(session.status().await, SessionStatus::Active);
    session.stop_session().await.unwrap();
    assert_eq!(session.stop_session().await.unwrap_err(), SessionError::NotActive);
}
