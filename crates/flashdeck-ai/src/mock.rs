//! Mock generator - deterministic offline cards for development and tests
//!
//! Splits the prompt into sentences and turns each one into a card. A sentence
//! of the form "X is Y" becomes "What is X?" with the sentence as the answer;
//! anything else becomes an "Explain" card.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::generator::{CardGenerator, GeneratedBatch, GeneratedCardDraft};

/// Model name reported by the mock generator
pub const MOCK_MODEL: &str = "mock-sentence-splitter";

/// Longer sentences are cut so every card fits the card text limits
const SENTENCE_MAX_CHARS: usize = 500;

/// Offline generator
#[derive(Debug, Clone)]
pub struct MockGenerator {
    max_cards: usize,
}

impl MockGenerator {
    #[must_use]
    pub fn new(max_cards: usize) -> Self {
        Self { max_cards }
    }
}

fn sentences(prompt: &str) -> impl Iterator<Item = &str> {
    prompt
        .split(|c: char| matches!(c, '.' | '!' | '?' | '\n' | ';'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].trim_end(),
        None => text,
    }
}

fn draft_for(sentence: &str) -> Option<GeneratedCardDraft> {
    let sentence = clip(sentence, SENTENCE_MAX_CHARS);
    for verb in [" is ", " are "] {
        if let Some((subject, rest)) = sentence.split_once(verb) {
            if !subject.trim().is_empty() && !rest.trim().is_empty() {
                let question = format!("What{verb}{}?", subject.trim());
                return GeneratedCardDraft::new(&question, &format!("{sentence}."));
            }
        }
    }
    GeneratedCardDraft::new(&format!("Explain: {sentence}"), &format!("{sentence}."))
}

#[async_trait]
impl CardGenerator for MockGenerator {
    fn provider(&self) -> &'static str {
        "mock"
    }

    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.chars().count()))]
    async fn generate(&self, prompt: &str) -> Result<GeneratedBatch> {
        let cards: Vec<GeneratedCardDraft> = sentences(prompt)
            .filter_map(draft_for)
            .take(self.max_cards)
            .collect();

        if cards.is_empty() {
            return Err(Error::EmptyResult);
        }

        debug!(cards = cards.len(), "Mock generation complete");
        Ok(GeneratedBatch {
            model: MOCK_MODEL.to_string(),
            raw_response: json!({ "provider": "mock", "cards": &cards }),
            cards,
        })
    }
}
