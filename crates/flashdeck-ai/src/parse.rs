//! Lenient parsing of model output into card drafts

use serde_json::Value;

use crate::error::{Error, Result};
use crate::generator::GeneratedCardDraft;

/// Remove a surrounding Markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Find the outermost JSON array or object inside free text
fn extract_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    let start = text.find(['[', '{'])?;
    let end = text.rfind([']', '}'])?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn field<'a>(item: &'a Value, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| item.get(*name).and_then(Value::as_str))
}

/// Parse cards from model output
///
/// Accepts a bare JSON array of `{question, answer}` objects or an object with
/// a `cards` array, optionally wrapped in a code fence or surrounded by prose.
/// Blank entries are dropped and the result is capped at `max_cards`.
pub fn parse_cards(content: &str, max_cards: usize) -> Result<Vec<GeneratedCardDraft>> {
    let text = strip_code_fence(content);
    let value = extract_json(text)
        .ok_or_else(|| Error::InvalidResponse("model output is not JSON".to_string()))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("cards")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::InvalidResponse("expected a `cards` array".to_string()))?,
        _ => {
            return Err(Error::InvalidResponse(
                "expected a JSON array of cards".to_string(),
            ))
        }
    };

    let cards: Vec<GeneratedCardDraft> = items
        .iter()
        .filter_map(|item| {
            let question = field(item, &["question", "front", "q"])?;
            let answer = field(item, &["answer", "back", "a"])?;
            GeneratedCardDraft::new(question, answer)
        })
        .take(max_cards)
        .collect();

    if cards.is_empty() {
        return Err(Error::EmptyResult);
    }
    Ok(cards)
}
