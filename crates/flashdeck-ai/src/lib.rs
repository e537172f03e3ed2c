//! Flashdeck AI - flashcard generation providers
//!
//! - [`CardGenerator`]: the seam the HTTP layer calls
//! - [`MockGenerator`]: offline, deterministic
//! - [`OpenAiGenerator`]: any OpenAI-compatible chat completions endpoint

#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod mock;
pub mod openai;
pub mod parse;

pub use error::{Error, Result};
pub use generator::{
    build_generator, CardGenerator, GeneratedBatch, GeneratedCardDraft, GeneratorSettings,
    ProviderKind, DEFAULT_MAX_CARDS,
};
pub use mock::MockGenerator;
pub use openai::{OpenAiConfig, OpenAiGenerator};
