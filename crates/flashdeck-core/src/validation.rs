//! Input validation for API commands
//!
//! Every validator trims its input and returns the cleaned value, so handlers
//! persist exactly what was checked. Lengths are counted in characters.

use crate::error::{Error, Result};

pub const PROMPT_MAX_CHARS: usize = 10_000;
pub const DECK_NAME_MAX_CHARS: usize = 100;
pub const DECK_DESCRIPTION_MAX_CHARS: usize = 500;
pub const QUESTION_MAX_CHARS: usize = 1_000;
pub const ANSWER_MAX_CHARS: usize = 2_000;
pub const ISSUE_DESCRIPTION_MAX_CHARS: usize = 1_000;
pub const RESPONSE_MS_MAX: i64 = 3_600_000;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

fn required_text(field: &str, label: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, format!("{label} cannot be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(Error::validation(
            field,
            format!("{label} cannot exceed {} characters", group_thousands(max)),
        ));
    }
    Ok(trimmed.to_string())
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Generation prompt: 1..=10,000 characters after trimming
pub fn prompt(value: Option<&str>) -> Result<String> {
    let value = value.ok_or_else(|| Error::validation("prompt", "Prompt is required"))?;
    required_text("prompt", "Prompt", value, PROMPT_MAX_CHARS)
}

pub fn deck_name(value: &str) -> Result<String> {
    required_text("name", "Deck name", value, DECK_NAME_MAX_CHARS)
}

/// Optional deck description. Blank descriptions become `None`.
pub fn deck_description(value: Option<&str>) -> Result<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > DECK_DESCRIPTION_MAX_CHARS {
        return Err(Error::validation(
            "description",
            format!(
                "Deck description cannot exceed {} characters",
                DECK_DESCRIPTION_MAX_CHARS
            ),
        ));
    }
    Ok(Some(value.to_string()))
}

pub fn question(value: &str) -> Result<String> {
    required_text("question", "Question", value, QUESTION_MAX_CHARS)
}

pub fn answer(value: &str) -> Result<String> {
    required_text("answer", "Answer", value, ANSWER_MAX_CHARS)
}

pub fn issue_description(value: &str) -> Result<String> {
    required_text(
        "description",
        "Description",
        value,
        ISSUE_DESCRIPTION_MAX_CHARS,
    )
}

/// Optional review duration in milliseconds
pub fn response_ms(value: Option<i64>) -> Result<Option<i64>> {
    match value {
        Some(ms) if !(0..=RESPONSE_MS_MAX).contains(&ms) => Err(Error::validation(
            "responseDurationMs",
            format!("Response duration must be between 0 and {RESPONSE_MS_MAX} ms"),
        )),
        other => Ok(other),
    }
}

/// Require that a partial update changes at least one field
pub fn at_least_one(fields: &[(&str, bool)]) -> Result<()> {
    if fields.iter().any(|(_, present)| *present) {
        return Ok(());
    }
    Err(Error::Validation {
        message: "At least one field must be provided".to_string(),
        fields: fields.iter().map(|(name, _)| (*name).to_string()).collect(),
    })
}

/// Clamp pagination parameters to `1..=100` and a non-negative offset
#[must_use]
pub fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}
