//! Remote conversation session backed by an OpenAI-compatible chat endpoint.
//!
//! The session owns the running transcript of turns sent to the model, so
//! callers only ever hand it the next user turn.

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use log::{debug, info};
use tokio::sync::Mutex;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// One stateful conversation with an external model.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Send the next user turn and return the model's reply text (possibly empty).
    async fn send_message(&self, message: &str) -> Result<String>;
}

/// Masks an API key for logging: first 7 chars + "***" + last 4 chars.
/// Keys of 11 chars or fewer are fully hidden.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}***{tail}")
}

pub struct OpenAiChatSession {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    system_instruction: String,
    turns: Mutex<Vec<ChatCompletionRequestMessage>>,
}

impl OpenAiChatSession {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: impl Into<String>,
        system_instruction: impl Into<String>,
    ) -> Self {
        let model = model.into();
        info!(
            "creating chat session model={} base_url={} api_key={}",
            model,
            base_url,
            mask_token(api_key)
        );
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        // One outbound call per turn: disable the client's rate-limit retries.
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        Self {
            client: Arc::new(Client::with_config(config).with_backoff(no_retry)),
            model,
            system_instruction: system_instruction.into(),
            turns: Mutex::new(Vec::new()),
        }
    }

    pub async fn turn_count(&self) -> usize {
        self.turns.lock().await.len()
    }
}

#[async_trait]
impl ChatSession for OpenAiChatSession {
    async fn send_message(&self, message: &str) -> Result<String> {
        // Held across the request so turns are recorded in send order.
        let mut turns = self.turns.lock().await;

        let user_turn: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(message.to_string())
            .build()?
            .into();

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(turns.len() + 2);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_instruction.clone())
                .build()?
                .into(),
        );
        messages.extend(turns.iter().cloned());
        messages.push(user_turn.clone());

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .build()?;

        debug!("sending turn {} to {}", turns.len() / 2 + 1, self.model);
        let response = self.client.chat().create(request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "chat usage prompt_tokens={} completion_tokens={} total_tokens={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let Some(choice) = response.choices.first() else {
            bail!("model returned no choices");
        };
        let reply = choice.message.content.clone().unwrap_or_default();

        turns.push(user_turn);
        turns.push(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(reply.clone())
                .build()?
                .into(),
        );

        Ok(reply)
    }
}
