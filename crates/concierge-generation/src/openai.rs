//! OpenAI-compatible chat-completions client.
//!
//! Works with OpenAI and any endpoint that follows the same contract
//! (Azure, Ollama, vLLM, LM Studio). Requests are non-streaming; model
//! and temperature come from configuration and never change per call.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use concierge_core::config::GenerationConfig;

use crate::generator::{GenerationError, TextGenerator};
use crate::prompt;

/// Chat-completions generation adapter.
#[derive(Debug)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    timeout_secs: u64,
}

impl OpenAiGenerator {
    /// Build a generator from the generation configuration.
    ///
    /// The API key is read once from the configured environment variable;
    /// a missing key fails construction, not the first request.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| GenerationError::MissingApiKey(config.api_key_env.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Pull the first non-empty completion out of a response.
fn extract_completion(completion: ChatCompletion) -> Result<String, GenerationError> {
    completion
        .choices
        .into_iter()
        .map(|c| c.message.content)
        .find(|content| !content.trim().is_empty())
        .ok_or(GenerationError::EmptyCompletion)
}

#[async_trait::async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, context: &str, question: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {"role": "user", "content": prompt::render(context, question)}
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.timeout_secs)
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("invalid completion: {}", e)))?;

        let reply = extract_completion(completion)?;
        debug!(model = %self.model, reply_len = reply.len(), "Completion received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_completion() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "Call 555-0100."}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_completion(completion).unwrap(), "Call 555-0100.");
    }

    #[test]
    fn test_extract_completion_skips_blank_choices() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices": [
                {"message": {"content": "  "}},
                {"message": {"content": "real answer"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(extract_completion(completion).unwrap(), "real answer");
    }

    #[test]
    fn test_extract_completion_empty_choices() {
        let completion: ChatCompletion = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            extract_completion(completion).unwrap_err(),
            GenerationError::EmptyCompletion
        ));
    }

    #[test]
    fn test_extract_completion_missing_choices_field() {
        let completion: ChatCompletion = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            extract_completion(completion).unwrap_err(),
            GenerationError::EmptyCompletion
        ));
    }

    #[test]
    fn test_from_config_missing_api_key() {
        let config = GenerationConfig {
            api_key_env: "CONCIERGE_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
            ..GenerationConfig::default()
        };
        let result = OpenAiGenerator::from_config(&config);
        assert!(matches!(
            result.unwrap_err(),
            GenerationError::MissingApiKey(_)
        ));
    }
}
