//! Retriever adapter: similarity search plus corpus filtering.
//!
//! Sits between the turn pipeline and the external index. Failures and
//! timeouts never escape — retrieval degrades to "no context" and the
//! pipeline takes its canned-reply path.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use concierge_core::config::RetrievalConfig;
use concierge_core::types::RetrievedPassage;

use crate::corpus::DocumentCorpus;
use crate::search::SimilaritySearch;

/// Top-k passage retrieval restricted to the currently known corpus.
pub struct Retriever {
    index: Arc<dyn SimilaritySearch>,
    corpus: DocumentCorpus,
    k: usize,
    timeout: Duration,
}

impl Retriever {
    pub fn new(index: Arc<dyn SimilaritySearch>, corpus: DocumentCorpus, k: usize) -> Self {
        Self {
            index,
            corpus,
            k,
            timeout: Duration::from_secs(10),
        }
    }

    /// Build a retriever from the retrieval configuration.
    pub fn from_config(index: Arc<dyn SimilaritySearch>, config: &RetrievalConfig) -> Self {
        Self {
            index,
            corpus: DocumentCorpus::new(
                config.document_dir.clone(),
                config.legal_extensions.clone(),
            ),
            k: config.k,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Retrieve up to `k` passages for a query, best first.
    ///
    /// Returns an empty list — never an error — when the backend is
    /// unreachable, times out, or has nothing indexed. Passages whose
    /// source document is no longer present in the corpus are dropped
    /// even if a stale index still returns them.
    pub async fn retrieve(&self, query: &str) -> Vec<RetrievedPassage> {
        let hits = match tokio::time::timeout(self.timeout, self.index.search(query, self.k)).await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(error = %e, "Similarity search failed; continuing without context");
                return Vec::new();
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Similarity search timed out; continuing without context"
                );
                return Vec::new();
            }
        };

        // Snapshot the corpus once per turn so every hit is judged against
        // the same document set.
        let known = self.corpus.document_names();

        hits.into_iter()
            .filter(|passage| known.iter().any(|name| name == &passage.document))
            .take(self.k)
            .collect()
    }
}
