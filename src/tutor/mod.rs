//! Tutor dialogue: prompt framing, the remote chat session and the bridge between them.

pub mod bridge;
pub mod client;
mod error;
pub mod prompt;

pub use bridge::TutorBridge;
pub use client::{mask_token, ChatSession, OpenAiChatSession, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::TutorError;
pub use prompt::{CONNECTION_FALLBACK, EMPTY_REPLY_FALLBACK, SYSTEM_INSTRUCTION};
