use thiserror::Error;

/// Lifecycle misuse and sensing failures surfaced by the session controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session already active")]
    AlreadyActive,
    #[error("no active session to stop")]
    NotActive,
    #[error("sensing failed: {0}")]
    SensingFailed(String),
}
