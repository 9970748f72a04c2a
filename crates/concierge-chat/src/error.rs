//! Error types for the turn pipeline.

use concierge_generation::GenerationError;

/// Generic reply returned to the caller when a turn fails.
///
/// Internal detail never reaches the conversational transcript; it is
/// logged instead.
pub const GENERIC_ERROR_REPLY: &str = "An error occurred during the conversation.";

/// Reply returned when the service is saturated; the caller may retry.
pub const BUSY_REPLY: &str = "The service is busy right now. Please try again shortly.";

/// Errors from a conversation turn.
///
/// Every variant maps to exactly one caller-visible reply via
/// [`TurnError::user_reply`]; the full error is for the logs.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("conversation lock unavailable: {0}")]
    Lock(String),
}

impl TurnError {
    /// The single user-facing reply for this error.
    pub fn user_reply(&self) -> &'static str {
        match self {
            TurnError::ResourceExhausted(_) => BUSY_REPLY,
            TurnError::Generation(_) | TurnError::Persistence(_) | TurnError::Lock(_) => {
                GENERIC_ERROR_REPLY
            }
        }
    }
}
