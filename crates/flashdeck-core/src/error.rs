//! Error types for flashdeck-core

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input failed validation
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable message for the first failing rule
        message: String,
        /// Names of the offending fields (API naming)
        fields: Vec<String>,
    },

    /// Leitner box outside 1..=3
    #[error("invalid leitner box: {0}")]
    InvalidBox(i64),

    /// Unknown enum value read from storage or config
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Invalid scheduling or quota configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Validation failure on a single field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: vec![field.to_string()],
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable error codes returned in API error bodies and stored on
/// failed generation attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationError,
    InvalidJson,
    Unauthorized,
    NotFound,
    Conflict,
    QuotaExceeded,
    AiServiceError,
    DatabaseError,
    ConfigurationError,
    InternalServerError,
}

impl ErrorCode {
    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::InvalidJson => "invalid_json",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::QuotaExceeded => "quota_exceeded",
            Self::AiServiceError => "ai_service_error",
            Self::DatabaseError => "database_error",
            Self::ConfigurationError => "configuration_error",
            Self::InternalServerError => "internal_server_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
