//! Concierge chat crate - the stateful turn orchestration core.
//!
//! Provides the per-turn pipeline (retrieve, compose, generate, append,
//! persist), per-conversation locking, the prompt-context composer, and
//! the reply postprocessor.

pub mod composer;
pub mod error;
pub mod lock;
pub mod pipeline;
pub mod postprocess;

pub use composer::{compose, NO_CONTEXT_FALLBACK};
pub use error::{TurnError, BUSY_REPLY, GENERIC_ERROR_REPLY};
pub use lock::ConversationLockMap;
pub use pipeline::{TurnPhase, TurnPipeline, NO_INPUT_REPLY, NO_RELEVANT_DATA_REPLY};
pub use postprocess::normalize;
