//! HTTP client for the external similarity-search backend.
//!
//! Speaks a Chroma-flavored query contract: the backend owns the
//! embeddings and the index, this side only sends query text and reads
//! ranked chunks back. Each chunk carries a `fileName` metadata entry
//! naming its source document.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use concierge_core::config::RetrievalConfig;
use concierge_core::error::ConciergeError;
use concierge_core::types::RetrievedPassage;

use crate::search::SimilaritySearch;

/// Similarity search over a remote index process.
pub struct HttpSearch {
    client: reqwest::Client,
    base_url: String,
    collection: String,
}

impl HttpSearch {
    /// Build a client from the retrieval configuration.
    pub fn from_config(config: &RetrievalConfig) -> Result<Self, ConciergeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ConciergeError::Retrieval(format!("Failed to build search client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.index_url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        })
    }

    fn query_url(&self) -> String {
        format!(
            "{}/collections/{}/query",
            self.base_url, self.collection
        )
    }
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    query_texts: Vec<&'a str>,
    n_results: usize,
    include: Vec<&'static str>,
}

/// Chroma-style query response: one inner list per query text.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<String>>,
    #[serde(default)]
    metadatas: Vec<Vec<Option<ChunkMetadata>>>,
    #[serde(default)]
    distances: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChunkMetadata {
    #[serde(rename = "fileName", default)]
    file_name: Option<String>,
}

/// Flatten the first query's result lists into passages, best first.
///
/// Rows without a `fileName` metadata entry are dropped: a chunk that
/// cannot be attributed to a document cannot pass the corpus filter
/// downstream anyway.
fn passages_from_response(response: QueryResponse) -> Vec<RetrievedPassage> {
    let contents = response.documents.into_iter().next().unwrap_or_default();
    let metadatas = response.metadatas.into_iter().next().unwrap_or_default();
    let distances = response.distances.into_iter().next().unwrap_or_default();

    contents
        .into_iter()
        .zip(metadatas)
        .zip(distances)
        .filter_map(|((content, metadata), score)| {
            let document = metadata.and_then(|m| m.file_name)?;
            Some(RetrievedPassage {
                document,
                content,
                score,
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl SimilaritySearch for HttpSearch {
    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, ConciergeError> {
        let body = QueryBody {
            query_texts: vec![query],
            n_results: k,
            include: vec!["documents", "metadatas", "distances"],
        };

        let response = self
            .client
            .post(self.query_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| ConciergeError::Retrieval(format!("search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConciergeError::Retrieval(format!(
                "search backend returned {}",
                status
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| ConciergeError::Retrieval(format!("invalid search response: {}", e)))?;

        let passages = passages_from_response(parsed);
        debug!(query_len = query.len(), hits = passages.len(), "Similarity search complete");
        Ok(passages)
    }
}
