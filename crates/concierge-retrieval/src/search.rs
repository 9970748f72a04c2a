//! Similarity-search capability boundary.
//!
//! The index itself (embeddings, storage, ranking) lives outside this
//! service; everything here talks to it through the `SimilaritySearch`
//! trait. Production uses the client in `http`; tests use the
//! in-memory stubs below.

use async_trait::async_trait;

use concierge_core::error::ConciergeError;
use concierge_core::types::RetrievedPassage;

/// Capability: rank indexed passages against a query.
///
/// Implementations return at most `k` passages, best first. The ordering
/// must be stable for identical inputs and index state.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    async fn search(&self, query: &str, k: usize)
        -> Result<Vec<RetrievedPassage>, ConciergeError>;
}

/// In-memory search stub backed by a fixed passage list.
///
/// Returns its passages in insertion order regardless of the query, capped
/// at `k`. Lets higher layers be exercised without an index process.
#[derive(Debug, Default, Clone)]
pub struct StaticIndex {
    passages: Vec<RetrievedPassage>,
}

impl StaticIndex {
    /// An index with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An index that always returns the given passages.
    pub fn with_passages(passages: Vec<RetrievedPassage>) -> Self {
        Self { passages }
    }
}

#[async_trait]
impl SimilaritySearch for StaticIndex {
    async fn search(
        &self,
        _query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, ConciergeError> {
        Ok(self.passages.iter().take(k).cloned().collect())
    }
}

/// Search stub that always fails, for exercising degraded paths.
#[derive(Debug, Default, Clone)]
pub struct FailingIndex;

#[async_trait]
impl SimilaritySearch for FailingIndex {
    async fn search(
        &self,
        _query: &str,
        _k: usize,
    ) -> Result<Vec<RetrievedPassage>, ConciergeError> {
        Err(ConciergeError::Retrieval(
            "search backend unavailable".to_string(),
        ))
    }
}
