use thiserror::Error;

/// Caller-side failures of the dialogue bridge. Remote failures never appear
/// here; they are turned into fallback replies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TutorError {
    #[error("tutor client not initialized; set an API key first")]
    NotInitialized,
    #[error("message text is empty")]
    EmptyMessage,
    #[error("a tutor reply is already in flight")]
    Busy,
}
