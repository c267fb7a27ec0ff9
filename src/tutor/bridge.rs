use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Result};

use crate::metrics::Reading;
use crate::settings::AppConfig;

use super::client::{ChatSession, OpenAiChatSession};
use super::error::TutorError;
use super::prompt::{build_context_prompt, CONNECTION_FALLBACK, EMPTY_REPLY_FALLBACK, SYSTEM_INSTRUCTION};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Mediates one exchange with the tutor model per user message.
///
/// The bridge starts uninitialized. Once a chat session is attached it keeps
/// that session (and its system instruction) for the rest of its life.
#[derive(Clone, Default)]
pub struct TutorBridge {
    session: Option<Arc<dyn ChatSession>>,
    in_flight: Arc<AtomicBool>,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TutorBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Arc<dyn ChatSession>) -> Self {
        Self {
            session: Some(session),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Open a chat session against the configured endpoint using `api_key`.
    pub fn initialize(&mut self, api_key: &str, config: &AppConfig) -> Result<()> {
        if api_key.trim().is_empty() {
            bail!("API key is empty");
        }
        if self.session.is_some() {
            bail!("tutor client already initialized");
        }

        let instruction = config
            .system_instruction
            .as_deref()
            .unwrap_or(SYSTEM_INSTRUCTION);
        let session = OpenAiChatSession::new(api_key, &config.base_url, &config.model, instruction);
        self.session = Some(Arc::new(session));
        log_info!("tutor bridge initialized with model {}", config.model);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send `text` with the context of `reading` and return displayable reply text.
    ///
    /// Remote failures resolve to a fallback reply; only caller mistakes are errors.
    pub async fn send_message_to_tutor(
        &self,
        text: &str,
        reading: &Reading,
    ) -> Result<String, TutorError> {
        let session = self.session.as_ref().ok_or(TutorError::NotInitialized)?;
        if text.trim().is_empty() {
            return Err(TutorError::EmptyMessage);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log_warn!("rejected overlapping tutor request");
            return Err(TutorError::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let prompt = build_context_prompt(text, reading);
        match session.send_message(&prompt).await {
            Ok(reply) if reply.is_empty() => {
                log_warn!("tutor model returned an empty reply");
                Ok(EMPTY_REPLY_FALLBACK.to_string())
            }
            Ok(reply) => Ok(reply),
            Err(err) => {
                log_error!("tutor request failed: {err:#}");
                Ok(CONNECTION_FALLBACK.to_string())
            }
        }
    }
}
