//! Concierge retrieval crate - the similarity-search adapter.
//!
//! Wraps the external index behind the `SimilaritySearch` capability,
//! enumerates the known document corpus, and filters stale hits so the
//! pipeline only ever sees passages from documents that still exist.

pub mod corpus;
pub mod http;
pub mod retriever;
pub mod search;

pub use corpus::DocumentCorpus;
pub use http::HttpSearch;
pub use retriever::Retriever;
pub use search::{FailingIndex, SimilaritySearch, StaticIndex};
