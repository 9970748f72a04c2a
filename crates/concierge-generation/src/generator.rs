//! Text-generation capability boundary.
//!
//! The language model lives outside this service. The pipeline only sees
//! the `TextGenerator` trait: context and question in, reply text out,
//! with failures carried as distinct error kinds rather than empty text.

use async_trait::async_trait;
use thiserror::Error;

use concierge_core::error::ConciergeError;

/// Errors from the generation backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request timed out after {0}s")]
    Timeout(u64),
    #[error("generation backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("generation transport error: {0}")]
    Transport(String),
    #[error("generation backend returned no completion")]
    EmptyCompletion,
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),
}

impl From<GenerationError> for ConciergeError {
    fn from(err: GenerationError) -> Self {
        ConciergeError::Generation(err.to_string())
    }
}

/// Capability: produce a reply for a question against a fixed context.
///
/// Model identity and sampling parameters are configuration, fixed for
/// the lifetime of the implementation; a streaming backend is buffered
/// into a complete text before returning.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, context: &str, question: &str) -> Result<String, GenerationError>;
}

/// Generator stub that echoes its context back, for exercising the
/// pipeline without a model.
#[derive(Debug, Default, Clone)]
pub struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, context: &str, question: &str) -> Result<String, GenerationError> {
        Ok(format!("Answering \"{}\" from: {}", question, context))
    }
}

/// Generator stub that always fails, for exercising error paths.
#[derive(Debug, Default, Clone)]
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _context: &str, _question: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Backend {
            status: 500,
            message: "stubbed failure".to_string(),
        })
    }
}
