pub mod capture;
pub mod chat;
pub mod metrics;
pub mod sensing;
pub mod session;
pub mod settings;
pub mod tutor;
pub mod utils;

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use capture::{CaptureDevice, SimulatedCamera};
use chat::{ChatMessage, Transcript};
use metrics::{panel, HistoryBuffer, Reading};
use sensing::MetricsGenerator;
use session::{SessionController, SessionEvent, SessionSnapshot};
use settings::AppConfig;
use tutor::{TutorBridge, TutorError};

/// One tutoring station: a session driving the metrics stream, the tutor
/// bridge, and the conversation transcript.
pub struct App {
    config: AppConfig,
    session: SessionController,
    bridge: TutorBridge,
    transcript: Transcript,
}

impl App {
    /// Builds the app. A configured API key unlocks the tutor immediately.
    pub fn new(config: AppConfig, capture: Box<dyn CaptureDevice>) -> Result<Self> {
        Self::with_generator(config, capture, MetricsGenerator::from_entropy())
    }

    pub fn with_generator(
        config: AppConfig,
        capture: Box<dyn CaptureDevice>,
        generator: MetricsGenerator,
    ) -> Result<Self> {
        config.validate()?;
        let history = HistoryBuffer::new(config.history_capacity)?;
        let session = SessionController::new(
            capture,
            generator,
            history,
            config.trend_window,
            config.tick_interval(),
            config.event_buffer,
        );

        let mut app = Self {
            config,
            session,
            bridge: TutorBridge::new(),
            transcript: Transcript::new(),
        };
        if let Some(key) = app.config.api_key.clone() {
            app.unlock(&key)?;
        }
        Ok(app)
    }

    /// Replace the tutor bridge, e.g. with one bound to a custom chat session.
    pub fn with_bridge(mut self, bridge: TutorBridge) -> Self {
        self.bridge = bridge;
        self
    }

    /// The tutor is locked until a credential has been supplied.
    pub fn is_locked(&self) -> bool {
        !self.bridge.is_initialized()
    }

    pub fn unlock(&mut self, api_key: &str) -> Result<()> {
        self.bridge.initialize(api_key, &self.config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn bridge(&self) -> &TutorBridge {
        &self.bridge
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Send a student message with the latest reading as context.
    pub async fn send_chat(&mut self, input: &str) -> Result<Option<ChatMessage>, TutorError> {
        let reading = self
            .session
            .current_reading()
            .await
            .unwrap_or_else(|| Reading::seed(Utc::now()));
        self.transcript.send(&self.bridge, input, &reading).await
    }
}

const HELP: &str = "\
commands:
  /start        start a session
  /stop         stop the session
  /toggle       start or stop
  /status       show the latest reading and trend
  /key <KEY>    unlock the tutor with an API key
  /quit         exit
anything else is sent to the tutor";

/// Headless console front end: session controls and tutor chat over stdin.
pub async fn run() -> Result<()> {
    let _ = dotenvy::dotenv();
    utils::logging::init_logging();

    info!("emotutor starting up...");

    let config = AppConfig::load()?;
    let mut app = App::new(config, Box::new(SimulatedCamera::new()))?;
    if app.is_locked() {
        warn!("no API key found (API_KEY or GEMINI_API_KEY); tutor chat is locked");
    }

    let mut events = app.session().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&mut app, line.trim()).await {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(SessionEvent::Reading(reading)) => {
                    if panel::high_confusion(&reading) {
                        info!("high confusion detected ({:.0}/100)", reading.confusion_level);
                    }
                }
                Ok(SessionEvent::StateChanged(snapshot)) => print_snapshot(&snapshot),
                Err(RecvError::Lagged(skipped)) => warn!("skipped {skipped} session events"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if app.session().is_active().await {
        app.session().stop_session().await?;
    }
    info!("emotutor shut down");
    Ok(())
}

/// Returns false when the runner should exit.
async fn handle_line(app: &mut App, line: &str) -> bool {
    let outcome: Result<()> = match line {
        "" => Ok(()),
        "/quit" | "/exit" => return false,
        "/help" => {
            println!("{HELP}");
            Ok(())
        }
        "/start" => app.session().start_session().await.map(|_| ()).map_err(Into::into),
        "/stop" => app.session().stop_session().await.map(|_| ()).map_err(Into::into),
        "/toggle" => app.session().toggle_session().await.map(|_| ()).map_err(Into::into),
        "/status" => {
            print_status(app).await;
            Ok(())
        }
        _ if line.starts_with("/key ") => app.unlock(line["/key ".len()..].trim()).map(|_| {
            println!("tutor unlocked");
        }),
        text => {
            match app.send_chat(text).await {
                Ok(Some(reply)) => println!("tutor> {}", reply.text),
                Ok(None) => {}
                Err(err) => println!("! {err}"),
            }
            Ok(())
        }
    };

    if let Err(err) = outcome {
        println!("! {err:#}");
    }
    true
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    let camera = if snapshot.stream_unavailable {
        "camera unavailable"
    } else {
        "camera ok"
    };
    println!(
        "session {:?} ({}s active, {})",
        snapshot.status,
        snapshot.active_ms / 1_000,
        camera
    );
}

async fn print_status(app: &App) {
    print_snapshot(&app.session().snapshot().await);
    let Some(reading) = app.session().current_reading().await else {
        println!("no readings yet");
        return;
    };

    for bar in panel::emotion_breakdown(&reading) {
        println!("  {:<9} {:>5.2}", bar.name, bar.value);
    }
    println!(
        "  voice {:+.2}  engagement {:.0}  confusion {:.0}  blinks {:.1}/min",
        reading.voice_emotion_score,
        reading.engagement_score,
        reading.confusion_level,
        reading.blink_rate
    );

    let trend = app.session().trend().await;
    if let (Some(first), Some(last)) = (trend.first(), trend.last()) {
        println!(
            "  engagement trend over {} points: {:.0} -> {:.0}",
            trend.len(),
            first.engagement_score,
            last.engagement_score
        );
    }
    if app.is_locked() {
        println!("  tutor locked: use /key <KEY>");
    }
}
