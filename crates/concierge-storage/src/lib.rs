//! Concierge storage crate - durable conversation persistence.
//!
//! Provides a WAL-mode SQLite database behind a bounded connection pool,
//! versioned migrations, and the conversation store with atomic turn
//! appends.

pub mod migrations;
pub mod pool;
pub mod store;

pub use pool::{ConnectionPool, PooledConnection};
pub use store::ConversationStore;
