//! Per-conversation concurrency control.
//!
//! All state mutation for one conversation id (load followed by append)
//! is a critical section: two concurrent turns on the same id must not
//! both load the same prior state and race their appends. Each id maps
//! to a `Semaphore(1)`; distinct ids never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::TurnError;

/// Keyed lock map serializing turns per conversation.
pub struct ConversationLockMap {
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl Default for ConversationLockMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationLockMap {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the turn lock for a conversation.
    ///
    /// Waits until the in-flight turn (if any) finishes. The permit
    /// auto-releases on drop; hold it for the whole load-to-persist span.
    pub async fn acquire(&self, key: &str) -> Result<OwnedSemaphorePermit, TurnError> {
        let sem = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|e| TurnError::Lock(format!("lock map poisoned: {}", e)))?;
            locks
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(Semaphore::new(1)))
                .clone()
        };

        sem.acquire_owned()
            .await
            .map_err(|e| TurnError::Lock(format!("lock closed: {}", e)))
    }

    /// Number of tracked conversations (for monitoring).
    pub fn tracked_count(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Drop entries whose lock is not currently held.
    pub fn prune_idle(&self) {
        if let Ok(mut locks) = self.locks.lock() {
            locks.retain(|_, sem| sem.available_permits() == 0);
        }
    }
}
