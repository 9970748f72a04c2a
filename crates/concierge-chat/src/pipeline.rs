//! Turn pipeline: the per-turn state machine.
//!
//! Each inbound message runs one fresh pass of
//! Loading -> Retrieving -> Composing -> Generating -> Appending ->
//! Persisted, with Failed reachable from any non-terminal phase. The
//! pipeline owns turn sequencing, the atomic turn-commit invariant, and
//! per-conversation serialization; retrieval, generation, and storage are
//! injected collaborators.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};
use uuid::Uuid;

use concierge_core::types::{ConversationId, Message, TurnReply, TurnRequest};
use concierge_generation::{GenerationError, TextGenerator};
use concierge_retrieval::Retriever;
use concierge_storage::ConversationStore;

use crate::composer;
use crate::error::TurnError;
use crate::lock::ConversationLockMap;
use crate::postprocess;

/// Canned reply for turns where retrieval produced no usable context.
pub const NO_RELEVANT_DATA_REPLY: &str = "No relevant data found.";

/// Reply for an empty inbound message on a conversation with no history.
pub const NO_INPUT_REPLY: &str = "Please send a question to get started.";

/// Phase of one turn's execution.
///
/// There is no cross-turn machine beyond the stored message sequence;
/// every turn starts at `Loading` seeded by the persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnPhase {
    Loading,
    Retrieving,
    Composing,
    Generating,
    Appending,
    Persisted,
    Failed,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::Loading => "Loading",
            TurnPhase::Retrieving => "Retrieving",
            TurnPhase::Composing => "Composing",
            TurnPhase::Generating => "Generating",
            TurnPhase::Appending => "Appending",
            TurnPhase::Persisted => "Persisted",
            TurnPhase::Failed => "Failed",
        };
        f.write_str(name)
    }
}

impl TurnPhase {
    /// Whether a transition from `self` to `target` is valid.
    ///
    /// `Retrieving -> Appending` is the canned-reply fast path that skips
    /// composing and generating. `Failed` absorbs every non-terminal
    /// phase.
    pub fn can_advance_to(self, target: TurnPhase) -> bool {
        match (self, target) {
            (TurnPhase::Loading, TurnPhase::Retrieving)
            | (TurnPhase::Retrieving, TurnPhase::Composing)
            | (TurnPhase::Retrieving, TurnPhase::Appending)
            | (TurnPhase::Composing, TurnPhase::Generating)
            | (TurnPhase::Generating, TurnPhase::Appending)
            | (TurnPhase::Appending, TurnPhase::Persisted) => true,
            (from, TurnPhase::Failed) => {
                from != TurnPhase::Persisted && from != TurnPhase::Failed
            }
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TurnPhase::Persisted | TurnPhase::Failed)
    }
}

/// The stateful conversation orchestrator.
///
/// Shared process-wide; every turn borrows it. All fields are set once at
/// startup and injected here rather than looked up globally.
pub struct TurnPipeline {
    store: Arc<ConversationStore>,
    retriever: Arc<Retriever>,
    generator: Arc<dyn TextGenerator>,
    locks: ConversationLockMap,
    generation_timeout: Duration,
}

impl TurnPipeline {
    pub fn new(
        store: Arc<ConversationStore>,
        retriever: Arc<Retriever>,
        generator: Arc<dyn TextGenerator>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            store,
            retriever,
            generator,
            locks: ConversationLockMap::new(),
            generation_timeout,
        }
    }

    /// Run one conversation turn.
    ///
    /// Holds the conversation's lock from load through persist, so two
    /// turns on the same id can never interleave sequence assignment. A
    /// failed turn commits nothing: the store either gains both messages
    /// of the turn or neither.
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnReply, TurnError> {
        let TurnRequest {
            conversation_id,
            text,
        } = request;
        let turn = Uuid::new_v4();

        let _guard = self.locks.acquire(conversation_id.as_str()).await?;

        let mut phase = TurnPhase::Loading;
        debug!(conversation = %conversation_id, %turn, %phase, "Turn started");

        let state = self
            .store
            .load(&conversation_id)
            .await
            .map_err(|e| self.storage_failure(&conversation_id, turn, phase, e))?;

        if text.trim().is_empty() {
            // No input, no turn: nothing retrieved, generated, or stored.
            // The caller gets the previous reply back (or a nudge to ask).
            let reply = state
                .last_assistant()
                .map(|m| m.content.clone())
                .unwrap_or_else(|| NO_INPUT_REPLY.to_string());
            debug!(conversation = %conversation_id, %turn, "Empty input; pass-through reply");
            return Ok(TurnReply {
                conversation_id,
                reply: postprocess::normalize(&reply),
            });
        }

        phase = self.advance(&conversation_id, turn, phase, TurnPhase::Retrieving);
        let passages = self.retriever.retrieve(&text).await;

        let next_seq = state.next_seq();

        if passages.is_empty() {
            // Fast path: no context, canned reply, no model call. The
            // human message is still stored so later turns keep the full
            // conversational memory.
            phase = self.advance(&conversation_id, turn, phase, TurnPhase::Appending);
            let messages = [
                Message::human(text, next_seq),
                Message::assistant(NO_RELEVANT_DATA_REPLY, next_seq + 1),
            ];
            self.store
                .append_turn(&conversation_id, &messages)
                .await
                .map_err(|e| self.storage_failure(&conversation_id, turn, phase, e))?;
            self.advance(&conversation_id, turn, phase, TurnPhase::Persisted);

            info!(conversation = %conversation_id, %turn, "Turn complete (no retrieval context)");
            return Ok(TurnReply {
                conversation_id,
                reply: NO_RELEVANT_DATA_REPLY.to_string(),
            });
        }

        phase = self.advance(&conversation_id, turn, phase, TurnPhase::Composing);
        let mut memory = state.human_texts();
        memory.push(&text);
        let context = composer::compose(&memory, &passages);

        phase = self.advance(&conversation_id, turn, phase, TurnPhase::Generating);
        let generation = tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(&context, &text),
        )
        .await;
        let reply = match generation {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                self.fail(&conversation_id, turn, phase, &e);
                return Err(TurnError::Generation(e));
            }
            Err(_) => {
                let e = GenerationError::Timeout(self.generation_timeout.as_secs());
                self.fail(&conversation_id, turn, phase, &e);
                return Err(TurnError::Generation(e));
            }
        };

        phase = self.advance(&conversation_id, turn, phase, TurnPhase::Appending);
        let messages = [
            Message::human(text, next_seq),
            Message::assistant(reply.clone(), next_seq + 1),
        ];
        self.store
            .append_turn(&conversation_id, &messages)
            .await
            .map_err(|e| self.storage_failure(&conversation_id, turn, phase, e))?;
        self.advance(&conversation_id, turn, phase, TurnPhase::Persisted);

        info!(
            conversation = %conversation_id,
            %turn,
            passages = passages.len(),
            "Turn complete"
        );
        Ok(TurnReply {
            conversation_id,
            reply: postprocess::normalize(&reply),
        })
    }

    /// Drop lock entries for conversations with no turn in flight.
    pub fn prune_locks(&self) {
        self.locks.prune_idle();
    }

    // -- Private helpers --

    fn advance(
        &self,
        id: &ConversationId,
        turn: Uuid,
        from: TurnPhase,
        to: TurnPhase,
    ) -> TurnPhase {
        debug_assert!(from.can_advance_to(to), "invalid transition {from} -> {to}");
        debug!(conversation = %id, %turn, %from, %to, "Turn phase");
        to
    }

    fn fail(
        &self,
        id: &ConversationId,
        turn: Uuid,
        from: TurnPhase,
        err: &dyn std::error::Error,
    ) {
        debug_assert!(from.can_advance_to(TurnPhase::Failed));
        error!(conversation = %id, %turn, phase = %from, error = %err, "Turn failed");
    }

    fn storage_failure(
        &self,
        id: &ConversationId,
        turn: Uuid,
        from: TurnPhase,
        err: concierge_core::ConciergeError,
    ) -> TurnError {
        self.fail(id, turn, from, &err);
        match err {
            concierge_core::ConciergeError::ResourceExhausted(msg) => {
                TurnError::ResourceExhausted(msg)
            }
            other => TurnError::Persistence(other.to_string()),
        }
    }
}
