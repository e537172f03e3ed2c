//! Server configuration types

use anyhow::{bail, Result};
use flashdeck_ai::{GeneratorSettings, ProviderKind, DEFAULT_MAX_CARDS};
use flashdeck_core::{LeitnerSchedule, QuotaPolicy};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub quota: QuotaConfig,
    pub study: StudyConfig,
    pub ai: AiConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// SQLite database location
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Falls back to the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Mock authentication
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub mock_user_id: Uuid,
    /// Honor `X-User-Id` (development and tests only)
    #[serde(default)]
    pub allow_user_header: bool,
}

/// AI generation quota
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    pub limit: u32,
    pub window_hours: u32,
}

/// Leitner schedule
#[derive(Debug, Clone, Deserialize)]
pub struct StudyConfig {
    pub box_intervals_days: Vec<u32>,
}

/// AI generator
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
    #[serde(default = "default_max_cards")]
    pub max_cards: usize,
}

fn default_max_cards() -> usize {
    DEFAULT_MAX_CARDS
}

impl AppConfig {
    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        self.quota_policy()?;
        self.schedule()?;
        if self.ai.max_cards == 0 {
            bail!("ai.max_cards must be positive");
        }
        if self.ai.timeout_secs == 0 {
            bail!("ai.timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn quota_policy(&self) -> Result<QuotaPolicy> {
        Ok(QuotaPolicy::new(self.quota.limit, self.quota.window_hours)?)
    }

    pub fn schedule(&self) -> Result<LeitnerSchedule> {
        Ok(LeitnerSchedule::from_days(&self.study.box_intervals_days)?)
    }

    /// Generator settings, taking the API key from `OPENAI_API_KEY` when the
    /// config has none
    pub fn generator_settings(&self) -> GeneratorSettings {
        let api_key = self.ai.api_key.clone().or_else(|| {
            std::env::var(flashdeck_ai::openai::API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from)
        });

        GeneratorSettings {
            provider: self.ai.provider,
            model: self.ai.model.clone(),
            base_url: self.ai.base_url.clone(),
            api_key,
            timeout: Duration::from_secs(self.ai.timeout_secs),
            max_cards: self.ai.max_cards,
        }
    }

    /// Database file, defaulting to the platform data directory
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(flashdeck_store::default_db_path)
    }
}

#[cfg(test)]
impl AppConfig {
    /// Embedded defaults only, no files or environment
    pub fn embedded_defaults() -> Self {
        use config::{Config, File, FileFormat};

        Config::builder()
            .add_source(File::from_str(super::loader::DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }
}
