//! OpenAI-compatible chat completions provider
//!
//! Works with any endpoint exposing `POST {base_url}/chat/completions`
//! (OpenAI, OpenRouter, Groq, a local Ollama, ...). The model is asked for a
//! JSON array of `{question, answer}` objects.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::generator::{CardGenerator, GeneratedBatch, DEFAULT_MAX_CARDS};
use crate::parse::parse_cards;

/// OpenAI API base URL
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Environment variable consulted when no key is configured
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const SYSTEM_PROMPT: &str = "You create study flashcards. Reply with a JSON array only, \
no prose. Each element is an object with a \"question\" string and an \"answer\" string. \
Questions are short and self-contained; answers are concise and factual.";

/// OpenAI-compatible provider configuration
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key
    pub api_key: SecretString,
    /// Base URL without the `/chat/completions` suffix
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
    /// Cap on cards per generation
    pub max_cards: usize,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &mask_api_key(self.api_key.expose_secret()))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_cards", &self.max_cards)
            .finish()
    }
}

/// Mask API key for safe display
fn mask_api_key(key: &str) -> String {
    if key.len() <= 8 || !key.is_ascii() {
        return "****".to_string();
    }
    format!("{}...{}", &key[..4], &key[key.len() - 4..])
}

/// Sanitize API error messages
fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("api key")
        || lower.contains("apikey")
        || lower.contains("invalid key")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
    {
        return format!("API authentication error. Please check FLASHDECK_AI__API_KEY or {API_KEY_ENV}.");
    }

    if lower.contains("rate limit") || lower.contains("quota") {
        return "AI provider rate limit exceeded. Please wait.".to_string();
    }

    if lower.contains("internal") || lower.contains("server error") {
        return "AI provider server error. Please try again later.".to_string();
    }

    if error.len() < 100 && !error.contains("sk-") && !error.contains("key") {
        return error.to_string();
    }

    "An API error occurred. Please try again.".to_string()
}

impl OpenAiConfig {
    /// Create a new configuration with an API key
    #[must_use]
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            max_cards: DEFAULT_MAX_CARDS,
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the card cap
    #[must_use]
    pub fn with_max_cards(mut self, max_cards: usize) -> Self {
        self.max_cards = max_cards;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible card generator
pub struct OpenAiGenerator {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiGenerator {
    /// Create a new generator
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.3,
        }
    }

    /// Turn a raw chat completion payload into a batch
    fn batch_from_completion(&self, raw: serde_json::Value) -> Result<GeneratedBatch> {
        let response: ChatResponse = serde_json::from_value(raw.clone())
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::InvalidResponse("No content in response".to_string()))?;

        let cards = parse_cards(&content, self.config.max_cards)?;

        Ok(GeneratedBatch {
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
            cards,
            raw_response: raw,
        })
    }
}

#[async_trait]
impl CardGenerator for OpenAiGenerator {
    fn provider(&self) -> &'static str {
        "openai"
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn generate(&self, prompt: &str) -> Result<GeneratedBatch> {
        debug!("Sending card generation request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    Error::Network(sanitize_api_error(&e.to_string()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "{status}: {}",
                sanitize_api_error(&error_text)
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let batch = self.batch_from_completion(raw)?;
        debug!(cards = batch.cards.len(), "Card generation complete");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn generator(max_cards: usize) -> OpenAiGenerator {
        let config = OpenAiConfig::new(SecretString::from("sk-test-1234567890abcdef".to_string()))
            .with_max_cards(max_cards);
        OpenAiGenerator::new(config).unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = OpenAiConfig::new(SecretString::from("sk-test".to_string()))
            .with_base_url("http://localhost:11434/v1/")
            .with_model("llama3")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_cards, DEFAULT_MAX_CARDS);
    }

    #[test]
    fn test_config_debug_masks_key() {
        let config = OpenAiConfig::new(SecretString::from("sk-1234567890abcdefghijklmnop".to_string()));
        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("1234567890abcdefghijkl"));
        assert!(debug_str.contains("sk-1...mnop"));
    }

    #[test]
    fn test_sanitize_api_error() {
        let sanitized = sanitize_api_error("Incorrect API key provided: sk-abc123");
        assert!(!sanitized.contains("sk-"));
        assert!(sanitized.contains(API_KEY_ENV));

        let sanitized = sanitize_api_error("You exceeded your current quota");
        assert!(sanitized.contains("rate limit"));

        assert_eq!(sanitize_api_error("model not found"), "model not found");
    }

    #[test]
    fn test_request_shape() {
        let generator = generator(20);
        let body = serde_json::to_value(generator.request("Photosynthesis")).unwrap();
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Photosynthesis");
    }

    #[test]
    fn test_completion_to_batch() {
        let raw = json!({
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "```json\n[{\"question\":\"Q1\",\"answer\":\"A1\"},{\"question\":\"Q2\",\"answer\":\"A2\"}]\n```"
                }
            }]
        });

        let batch = generator(1).batch_from_completion(raw.clone()).unwrap();
        assert_eq!(batch.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(batch.cards.len(), 1);
        assert_eq!(batch.raw_response, raw);
    }

    #[test]
    fn test_completion_without_content() {
        let raw = json!({ "choices": [] });
        assert!(matches!(
            generator(20).batch_from_completion(raw),
            Err(Error::InvalidResponse(_))
        ));
    }
}
