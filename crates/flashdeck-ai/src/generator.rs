//! Generator trait and provider selection

use async_trait::async_trait;
use flashdeck_core::validation;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::mock::MockGenerator;
use crate::openai::{OpenAiConfig, OpenAiGenerator};

/// Default cap on cards per generation
pub const DEFAULT_MAX_CARDS: usize = 20;

/// One question/answer pair proposed by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCardDraft {
    pub question: String,
    pub answer: String,
}

impl GeneratedCardDraft {
    /// Trimmed draft, or `None` when either side breaks the card text rules
    #[must_use]
    pub fn new(question: &str, answer: &str) -> Option<Self> {
        Some(Self {
            question: validation::question(question).ok()?,
            answer: validation::answer(answer).ok()?,
        })
    }
}

/// Output of one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedBatch {
    /// Model that produced the cards
    pub model: String,
    /// Usable cards, already trimmed and capped
    pub cards: Vec<GeneratedCardDraft>,
    /// Provider payload, kept for auditing
    pub raw_response: serde_json::Value,
}

/// Turns a free-text prompt into flashcard drafts
#[async_trait]
pub trait CardGenerator: Send + Sync {
    /// Provider name
    fn provider(&self) -> &'static str;

    /// Generate cards for `prompt`
    async fn generate(&self, prompt: &str) -> Result<GeneratedBatch>;
}

/// Which generator backs the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Offline sentence splitter
    #[default]
    Mock,
    /// OpenAI-compatible chat completions endpoint
    OpenAi,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "openai" => Ok(Self::OpenAi),
            _ => Err(format!("unknown AI provider: {s}")),
        }
    }
}

/// Settings needed to build a generator
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout: Duration,
    pub max_cards: usize,
}

/// Build the configured generator
///
/// Returns [`Error::NotConfigured`] when the selected provider is missing
/// credentials; callers may keep running without a generator.
pub fn build_generator(settings: &GeneratorSettings) -> Result<Arc<dyn CardGenerator>> {
    match settings.provider {
        ProviderKind::Mock => {
            info!(max_cards = settings.max_cards, "Using mock card generator");
            Ok(Arc::new(MockGenerator::new(settings.max_cards)))
        }
        ProviderKind::OpenAi => {
            let Some(api_key) = settings.api_key.clone() else {
                warn!("OpenAI provider selected without an API key");
                return Err(Error::NotConfigured(
                    "set FLASHDECK_AI__API_KEY or OPENAI_API_KEY".to_string(),
                ));
            };
            let config = OpenAiConfig::new(api_key)
                .with_base_url(settings.base_url.clone())
                .with_model(settings.model.clone())
                .with_timeout(settings.timeout)
                .with_max_cards(settings.max_cards);
            info!(model = %config.model, base_url = %config.base_url, "Using OpenAI-compatible card generator");
            Ok(Arc::new(OpenAiGenerator::new(config)?))
        }
    }
}
