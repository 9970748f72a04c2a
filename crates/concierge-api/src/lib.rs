//! Concierge API crate - axum HTTP boundary.
//!
//! Exposes the single chat operation and a health check. All
//! conversation logic lives in the chat crate; this layer only validates
//! identity, forwards the question, and shapes responses.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
