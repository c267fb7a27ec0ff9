use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::{Emotion, Reading};
use crate::tutor::{TutorBridge, TutorError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Dominant emotion when the student sent this message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_emotion: Option<Emotion>,
}

impl ChatMessage {
    fn new(role: Role, text: String, context_emotion: Option<Emotion>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            timestamp: Utc::now(),
            context_emotion,
        }
    }
}

/// Append-only conversation log, in the order messages were produced.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push_user(&mut self, text: impl Into<String>, emotion: Emotion) -> &ChatMessage {
        self.push(ChatMessage::new(Role::User, text.into(), Some(emotion)))
    }

    pub fn push_model(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(ChatMessage::new(Role::Model, text.into(), None))
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// One exchange: record the student's message, ask the tutor, record the reply.
    ///
    /// Blank input is ignored (`Ok(None)`). A locked or busy bridge records
    /// nothing, so every user message in the log is followed by its reply.
    pub async fn send(
        &mut self,
        bridge: &TutorBridge,
        input: &str,
        reading: &Reading,
    ) -> Result<Option<ChatMessage>, TutorError> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        if !bridge.is_initialized() {
            return Err(TutorError::NotInitialized);
        }
        if bridge.is_busy() {
            return Err(TutorError::Busy);
        }

        self.push_user(input, reading.dominant_emotion());

        match bridge.send_message_to_tutor(input, reading).await {
            Ok(reply) => Ok(Some(self.push_model(reply).clone())),
            Err(err) => {
                // Another clone of the bridge won the race; drop the unanswered message.
                self.messages.pop();
                warn!("tutor exchange failed: {err}");
                Err(err)
            }
        }
    }
}
