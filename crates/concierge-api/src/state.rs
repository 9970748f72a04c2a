//! Application state shared across all route handlers.
//!
//! AppState holds the turn pipeline and server metadata. It is passed to
//! handlers via axum's State extractor; every per-request operation takes
//! its collaborators from here rather than from globals.

use std::sync::Arc;
use std::time::Instant;

use concierge_chat::TurnPipeline;

/// Shared application state.
///
/// Fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// The conversation turn pipeline.
    pub pipeline: Arc<TurnPipeline>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState around a pipeline.
    pub fn new(pipeline: Arc<TurnPipeline>) -> Self {
        Self {
            pipeline,
            start_time: Instant::now(),
        }
    }
}
