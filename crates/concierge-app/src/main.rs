//! Concierge application binary - composition root.
//!
//! Ties together all concierge crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Initialize the conversation store (pooled SQLite)
//! 3. Build the retriever (HTTP similarity search + corpus filter)
//! 4. Build the generation adapter (OpenAI-compatible client)
//! 5. Start the axum REST API server
//!
//! Everything shared is constructed exactly once here and injected;
//! nothing is looked up through globals at request time.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use concierge_api::{start_server, AppState};
use concierge_chat::TurnPipeline;
use concierge_core::config::ConciergeConfig;
use concierge_generation::OpenAiGenerator;
use concierge_retrieval::{HttpSearch, Retriever};
use concierge_storage::ConversationStore;

/// Resolve the config file path (CONCIERGE_CONFIG env, or ./concierge.toml).
fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("CONCIERGE_CONFIG") {
        return PathBuf::from(p);
    }
    PathBuf::from("concierge.toml")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config first: the log level comes from it.
    let config_file = config_path();
    let config = ConciergeConfig::load_or_default(&config_file);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.general.log_level.clone())
            }),
        )
        .init();

    tracing::info!("Starting concierge v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let store = Arc::new(ConversationStore::open(&config.storage)?);

    // Retrieval: remote index behind the corpus filter.
    let search = Arc::new(HttpSearch::from_config(&config.retrieval)?);
    let retriever = Arc::new(Retriever::from_config(search, &config.retrieval));
    tracing::info!(
        index = %config.retrieval.index_url,
        documents = %config.retrieval.document_dir,
        k = config.retrieval.k,
        "Retriever ready"
    );

    // Generation.
    let generator = Arc::new(OpenAiGenerator::from_config(&config.generation)?);
    tracing::info!(model = %config.generation.model, "Generation adapter ready");

    // Turn pipeline.
    let pipeline = Arc::new(TurnPipeline::new(
        store,
        retriever,
        generator,
        Duration::from_secs(config.generation.timeout_secs),
    ));

    // API server; serves until ctrl-c, then drains in-flight turns. The
    // store (and its pool) tears down when the pipeline drops after the
    // server returns.
    let state = AppState::new(pipeline);
    start_server(&config.general, state).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
