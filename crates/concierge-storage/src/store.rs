//! Durable conversation store.
//!
//! Owns the persisted message history for every conversation. Exposes the
//! two access patterns the turn pipeline needs: read all messages for an
//! id ordered by sequence, and atomically append the messages of one turn.

use std::time::Duration;

use rusqlite::TransactionBehavior;
use tracing::debug;

use concierge_core::config::StorageConfig;
use concierge_core::error::ConciergeError;
use concierge_core::types::{ConversationId, ConversationState, Message, Role};

use crate::pool::ConnectionPool;

/// SQLite-backed conversation persistence.
///
/// Distinct conversation ids can be read and written concurrently (bounded
/// by the pool). Same-id turn serialization is the pipeline's job; the
/// primary key on `(conversation_id, seq)` is the store's last line of
/// defense against interleaved sequence assignment.
pub struct ConversationStore {
    pool: ConnectionPool,
}

impl ConversationStore {
    /// Open the store described by the storage configuration.
    pub fn open(config: &StorageConfig) -> Result<Self, ConciergeError> {
        let pool = ConnectionPool::open(
            std::path::Path::new(&config.db_path),
            config.pool_size,
            Duration::from_millis(config.acquire_timeout_ms),
            Duration::from_millis(config.busy_timeout_ms),
        )?;
        Ok(Self { pool })
    }

    /// Open an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, ConciergeError> {
        Ok(Self {
            pool: ConnectionPool::in_memory()?,
        })
    }

    /// Wrap an existing pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Load the full ordered history for a conversation.
    ///
    /// Unknown ids yield an empty state, not an error: a conversation is
    /// created lazily by its first appended turn.
    pub async fn load(&self, id: &ConversationId) -> Result<ConversationState, ConciergeError> {
        let conn = self.pool.acquire().await?;

        let mut stmt = conn
            .prepare(
                "SELECT seq, role, content FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY seq ASC",
            )
            .map_err(|e| ConciergeError::Storage(format!("Failed to prepare load: {}", e)))?;

        let rows = stmt
            .query_map([id.as_str()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| ConciergeError::Storage(format!("Failed to load messages: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            let (seq, role, content) =
                row.map_err(|e| ConciergeError::Storage(format!("Failed to read row: {}", e)))?;
            messages.push(Message {
                role: Role::parse(&role)?,
                content,
                seq,
            });
        }

        debug!(conversation = %id, messages = messages.len(), "Conversation loaded");

        Ok(ConversationState {
            id: id.clone(),
            messages,
        })
    }

    /// Atomically append the messages of one turn.
    ///
    /// Either every message in the slice is committed or none is. A
    /// sequence collision (another writer got there first) fails the whole
    /// batch and leaves the stored history untouched.
    pub async fn append_turn(
        &self,
        id: &ConversationId,
        messages: &[Message],
    ) -> Result<(), ConciergeError> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut conn = self.pool.acquire().await?;
        let now = chrono::Utc::now().timestamp();

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ConciergeError::Storage(format!("Failed to begin transaction: {}", e)))?;

        for message in messages {
            tx.execute(
                "INSERT INTO messages (conversation_id, seq, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    id.as_str(),
                    message.seq,
                    message.role.as_str(),
                    message.content,
                    now,
                ],
            )
            .map_err(|e| {
                ConciergeError::Storage(format!(
                    "Failed to append message seq {}: {}",
                    message.seq, e
                ))
            })?;
        }

        tx.commit()
            .map_err(|e| ConciergeError::Storage(format!("Failed to commit turn: {}", e)))?;

        debug!(conversation = %id, appended = messages.len(), "Turn committed");

        Ok(())
    }

    /// Number of stored messages for a conversation.
    pub async fn message_count(&self, id: &ConversationId) -> Result<usize, ConciergeError> {
        let conn = self.pool.acquire().await?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                [id.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| ConciergeError::Storage(format!("Failed to count messages: {}", e)))?;
        Ok(count as usize)
    }
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore").finish()
    }
}
