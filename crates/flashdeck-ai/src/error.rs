//! Error types for flashdeck-ai

use thiserror::Error;

/// Card generation error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// API error
    #[error("api error: {0}")]
    Api(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider answered but produced no usable card
    #[error("generation produced no cards")]
    EmptyResult,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
