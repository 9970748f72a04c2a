use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for the concierge service.
///
/// Loaded from `concierge.toml` by default. Each section corresponds to one
/// subsystem; every value can be overridden without recompilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConciergeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ConciergeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConciergeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8000,
            log_level: "info".to_string(),
        }
    }
}

/// Retrieval settings: the similarity-search backend and document corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Base URL of the similarity-search backend.
    pub index_url: String,
    /// Collection name holding the indexed document chunks.
    pub collection: String,
    /// Number of passages to retrieve per question.
    pub k: usize,
    /// Directory of source documents; files present here define the
    /// currently known corpus.
    pub document_dir: String,
    /// File extensions that count as corpus documents.
    pub legal_extensions: Vec<String>,
    /// Per-search timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_url: "http://127.0.0.1:8800".to_string(),
            collection: "concierge-docs".to_string(),
            k: 2,
            document_dir: "./documents".to_string(),
            legal_extensions: vec![".md".to_string()],
            timeout_secs: 10,
        }
    }
}

/// Generation settings: the chat-completions backend and sampling.
///
/// Model and temperature are fixed for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible chat-completions endpoint.
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_secs: 30,
        }
    }
}

/// Storage settings: conversation database and connection bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite conversation database.
    pub db_path: String,
    /// Fixed number of pooled connections.
    pub pool_size: usize,
    /// How long an acquisition may wait for a free connection before
    /// failing with a resource-exhaustion error, in milliseconds.
    pub acquire_timeout_ms: u64,
    /// SQLite busy timeout bounding lock waits on writes, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "./data/concierge.db".to_string(),
            pool_size: 4,
            acquire_timeout_ms: 5_000,
            busy_timeout_ms: 5_000,
        }
    }
}
