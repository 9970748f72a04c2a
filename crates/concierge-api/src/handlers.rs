//! Route handler functions.
//!
//! The chat endpoint is a thin adapter over the turn pipeline: it
//! validates the conversation identity, forwards the question, and maps
//! every pipeline failure to a single generic reply body. Internal error
//! detail goes to the logs, never to the transcript.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use concierge_core::types::{ConversationId, TurnRequest};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

/// Request body for POST /chat/start.
#[derive(Debug, Deserialize)]
pub struct ChatStartRequest {
    pub phone_number: Option<String>,
    pub question: Option<String>,
}

/// Response body for POST /chat/start.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatStartResponse {
    pub phone_number: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /chat/start - run one conversation turn.
///
/// The phone number is the conversation identity; it must be non-empty
/// but is otherwise opaque. An empty question is the pipeline's no-op
/// pass-through, not an error.
pub async fn chat_start(
    State(state): State<AppState>,
    Json(request): Json<ChatStartRequest>,
) -> Result<Json<ChatStartResponse>, ApiError> {
    let conversation_id = ConversationId::new(request.phone_number.unwrap_or_default())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let question = request.question.unwrap_or_default();

    let turn = TurnRequest {
        conversation_id: conversation_id.clone(),
        text: question,
    };

    match state.pipeline.handle_turn(turn).await {
        Ok(reply) => Ok(Json(ChatStartResponse {
            phone_number: reply.conversation_id.into_string(),
            message: reply.reply,
        })),
        Err(e) => {
            // Full detail is already logged by the pipeline; log the
            // mapping here and hand the caller the generic reply.
            tracing::error!(conversation = %conversation_id, error = %e, "Turn failed at boundary");
            Ok(Json(ChatStartResponse {
                phone_number: conversation_id.into_string(),
                message: e.user_reply().to_string(),
            }))
        }
    }
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
