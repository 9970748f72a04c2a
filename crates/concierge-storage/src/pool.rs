//! Bounded SQLite connection pool.
//!
//! A fixed set of connections shared process-wide. Acquisition waits for a
//! free connection up to a configured bound, then fails with a
//! resource-exhaustion error rather than growing the pool. WAL mode keeps
//! readers and the single writer from blocking each other.

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::info;

use concierge_core::error::ConciergeError;

use crate::migrations;

/// Fixed-size pool of SQLite connections.
///
/// The semaphore bounds concurrent checkouts; the idle list holds the
/// connections themselves. A checkout that cannot get a permit within the
/// acquire timeout fails with `ResourceExhausted` so callers can surface a
/// transient-failure reply instead of queueing forever.
pub struct ConnectionPool {
    idle: Mutex<Vec<Connection>>,
    slots: Arc<Semaphore>,
    size: usize,
    acquire_timeout: Duration,
}

impl ConnectionPool {
    /// Open (or create) a pooled database at the given path.
    ///
    /// Opens `size` connections, configures WAL mode and busy timeout on
    /// each, and runs all pending migrations once.
    pub fn open(
        path: &Path,
        size: usize,
        acquire_timeout: Duration,
        busy_timeout: Duration,
    ) -> Result<Self, ConciergeError> {
        if size == 0 {
            return Err(ConciergeError::Config(
                "storage pool_size must be at least 1".to_string(),
            ));
        }

        // Ensure parent directory exists.
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open(path)
                .map_err(|e| ConciergeError::Storage(format!("Failed to open database: {}", e)))?;
            configure(&conn, busy_timeout)?;
            connections.push(conn);
        }

        // Run migrations once; every connection sees the same file.
        migrations::run_migrations(&connections[0])?;

        info!(
            path = %path.display(),
            pool_size = size,
            "Conversation database opened"
        );

        Ok(Self {
            idle: Mutex::new(connections),
            slots: Arc::new(Semaphore::new(size)),
            size,
            acquire_timeout,
        })
    }

    /// Open a single-connection in-memory pool (for testing).
    ///
    /// SQLite in-memory databases are private to their connection, so the
    /// pool is fixed at one slot.
    pub fn in_memory() -> Result<Self, ConciergeError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ConciergeError::Storage(format!("Failed to open in-memory db: {}", e)))?;
        configure(&conn, Duration::from_millis(5_000))?;
        migrations::run_migrations(&conn)?;

        Ok(Self {
            idle: Mutex::new(vec![conn]),
            slots: Arc::new(Semaphore::new(1)),
            size: 1,
            acquire_timeout: Duration::from_millis(5_000),
        })
    }

    /// Check out a connection, waiting up to the acquire timeout.
    pub async fn acquire(&self) -> Result<PooledConnection<'_>, ConciergeError> {
        let permit = match tokio::time::timeout(
            self.acquire_timeout,
            Arc::clone(&self.slots).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(e)) => {
                return Err(ConciergeError::Storage(format!(
                    "connection pool closed: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(ConciergeError::ResourceExhausted(format!(
                    "no database connection free within {}ms",
                    self.acquire_timeout.as_millis()
                )))
            }
        };

        let conn = self
            .idle
            .lock()
            .map_err(|e| ConciergeError::Storage(format!("pool lock poisoned: {}", e)))?
            .pop()
            .ok_or_else(|| {
                ConciergeError::Storage("pool inventory empty while holding permit".to_string())
            })?;

        Ok(PooledConnection {
            pool: self,
            conn: Some(conn),
            _permit: permit,
        })
    }

    /// Configured pool size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of connections currently checked in (for monitoring).
    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|v| v.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("size", &self.size)
            .finish()
    }
}

/// Apply per-connection pragmas.
fn configure(conn: &Connection, busy_timeout: Duration) -> Result<(), ConciergeError> {
    conn.execute_batch(&format!(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {};",
        busy_timeout.as_millis()
    ))
    .map_err(|e| ConciergeError::Storage(format!("Failed to set pragmas: {}", e)))
}

/// A checked-out connection; returns to the pool on drop.
#[derive(Debug)]
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Ok(mut idle) = self.pool.idle.lock() {
                idle.push(conn);
            }
            // A poisoned lock drops the connection; the permit is still
            // released, so a later checkout surfaces the inventory error.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_pool(size: usize, acquire_ms: u64) -> (tempfile::TempDir, ConnectionPool) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = ConnectionPool::open(
            &path,
            size,
            Duration::from_millis(acquire_ms),
            Duration::from_millis(1_000),
        )
        .unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_acquire_and_query() {
        let (_dir, pool) = temp_pool(2, 1_000);
        let conn = pool.acquire().await.unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_connection_returns_on_drop() {
        let (_dir, pool) = temp_pool(1, 1_000);
        {
            let _conn = pool.acquire().await.unwrap();
            assert_eq!(pool.idle_count(), 0);
        }
        assert_eq!(pool.idle_count(), 1);

        // The slot is usable again.
        let _conn = pool.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn test_exhausted_pool_times_out() {
        let (_dir, pool) = temp_pool(1, 50);
        let _held = pool.acquire().await.unwrap();

        let result = pool.acquire().await;
        assert!(matches!(
            result.unwrap_err(),
            ConciergeError::ResourceExhausted(_)
        ));
    }

    #[tokio::test]
    async fn test_waiter_proceeds_after_release() {
        let (_dir, pool) = temp_pool(1, 2_000);
        let pool = Arc::new(pool);

        let held = pool.acquire().await.unwrap();

        let pool2 = Arc::clone(&pool);
        let waiter = tokio::spawn(async move { pool2.acquire().await.map(|_| ()) });

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(held);

        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_zero_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConnectionPool::open(
            &dir.path().join("zero.db"),
            0,
            Duration::from_millis(100),
            Duration::from_millis(100),
        );
        assert!(matches!(result.unwrap_err(), ConciergeError::Config(_)));
    }

    #[tokio::test]
    async fn test_in_memory_pool() {
        let pool = ConnectionPool::in_memory().unwrap();
        assert_eq!(pool.size(), 1);
        let conn = pool.acquire().await.unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert!(mode == "wal" || mode == "memory");
    }

    #[tokio::test]
    async fn test_wal_mode_enabled_on_file_db() {
        let (_dir, pool) = temp_pool(2, 1_000);
        let conn = pool.acquire().await.unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }
}
