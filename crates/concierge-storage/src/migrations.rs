//! Database schema migrations.
//!
//! Applies the initial schema: the messages table keyed by conversation id
//! and sequence index, plus the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use concierge_core::error::ConciergeError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), ConciergeError> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| ConciergeError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| ConciergeError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), ConciergeError> {
    conn.execute_batch(
        "
        -- One row per message; the primary key enforces per-conversation
        -- sequence uniqueness, so a racing writer cannot silently overwrite
        -- another turn's rows.
        CREATE TABLE IF NOT EXISTS messages (
            conversation_id TEXT NOT NULL,
            seq             INTEGER NOT NULL,
            role            TEXT NOT NULL
                            CHECK (role IN ('human', 'assistant')),
            content         TEXT NOT NULL DEFAULT '',
            created_at      INTEGER NOT NULL,
            PRIMARY KEY (conversation_id, seq)
        ) WITHOUT ROWID;

        -- Record migration.
        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| ConciergeError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        // Running again should be idempotent.
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_messages_table_exists() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO messages (conversation_id, seq, role, content, created_at)
             VALUES ('+15550100', 0, 'human', 'hello', 1700000000)",
            [],
        )
        .unwrap();

        let content: String = conn
            .query_row(
                "SELECT content FROM messages WHERE conversation_id = '+15550100' AND seq = 0",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn test_messages_role_check() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO messages (conversation_id, seq, role, content, created_at)
             VALUES ('+15550100', 0, 'system', 'x', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_messages_seq_collision_rejected() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO messages (conversation_id, seq, role, content, created_at)
             VALUES ('+15550100', 0, 'human', 'a', 0)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO messages (conversation_id, seq, role, content, created_at)
             VALUES ('+15550100', 0, 'human', 'b', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_same_seq_different_conversations_allowed() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO messages (conversation_id, seq, role, content, created_at)
             VALUES ('+15550100', 0, 'human', 'a', 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO messages (conversation_id, seq, role, content, created_at)
             VALUES ('+15550199', 0, 'human', 'b', 0)",
            [],
        )
        .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
