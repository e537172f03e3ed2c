//! Row types and conversions between SQLite rows and domain entities

use chrono::{DateTime, SecondsFormat, Utc};
use flashdeck_core::{
    AiGeneratedCard, AiGeneration, Card, CardIssueReport, CardReview, Deck, GenerationAttempt,
    LeitnerBox, StudySession,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Encode a timestamp as fixed-width RFC 3339 so text order equals time order
pub(crate) fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_ts(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Serialization(format!("invalid timestamp: {e}")))
}

fn parse_opt_ts(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_ts).transpose()
}

pub(crate) fn parse_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Serialization(format!("invalid uuid: {e}")))
}

fn parse_opt_id(value: Option<String>) -> Result<Option<Uuid>> {
    value.as_deref().map(parse_id).transpose()
}

fn parse_enum<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse().map_err(Error::Serialization)
}

#[derive(FromRow)]
pub(crate) struct DeckRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<DeckRow> for Deck {
    type Error = Error;

    fn try_from(row: DeckRow) -> Result<Self> {
        Ok(Deck {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            name: row.name,
            description: row.description,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct CardRow {
    pub id: String,
    pub user_id: String,
    pub deck_id: String,
    pub question: String,
    pub answer: String,
    pub question_normalized: String,
    pub origin: String,
    pub leitner_box: i64,
    pub due_at: String,
    pub last_reviewed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<CardRow> for Card {
    type Error = Error;

    fn try_from(row: CardRow) -> Result<Self> {
        Ok(Card {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            deck_id: parse_id(&row.deck_id)?,
            question: row.question,
            answer: row.answer,
            question_normalized: row.question_normalized,
            origin: parse_enum(&row.origin)?,
            leitner_box: LeitnerBox::new(row.leitner_box)?,
            due_at: parse_ts(&row.due_at)?,
            last_reviewed_at: parse_opt_ts(row.last_reviewed_at)?,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub deck_id: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub cards_reviewed: i64,
    pub know_count: i64,
    pub dont_know_count: i64,
}

impl TryFrom<SessionRow> for StudySession {
    type Error = Error;

    fn try_from(row: SessionRow) -> Result<Self> {
        Ok(StudySession {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            deck_id: parse_id(&row.deck_id)?,
            started_at: parse_ts(&row.started_at)?,
            ended_at: parse_opt_ts(row.ended_at)?,
            cards_reviewed: row.cards_reviewed,
            know_count: row.know_count,
            dont_know_count: row.dont_know_count,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct ReviewRow {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub card_id: String,
    pub result: String,
    pub prev_box: i64,
    pub new_box: i64,
    pub response_ms: Option<i64>,
    pub reviewed_at: String,
}

impl TryFrom<ReviewRow> for CardReview {
    type Error = Error;

    fn try_from(row: ReviewRow) -> Result<Self> {
        Ok(CardReview {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            session_id: parse_id(&row.session_id)?,
            card_id: parse_id(&row.card_id)?,
            result: parse_enum(&row.result)?,
            prev_box: LeitnerBox::new(row.prev_box)?,
            new_box: LeitnerBox::new(row.new_box)?,
            response_ms: row.response_ms,
            reviewed_at: parse_ts(&row.reviewed_at)?,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct GenerationRow {
    pub id: String,
    pub user_id: String,
    pub prompt: String,
    pub model: Option<String>,
    pub raw_response: Option<String>,
    pub status: String,
    pub error_code: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl TryFrom<GenerationRow> for AiGeneration {
    type Error = Error;

    fn try_from(row: GenerationRow) -> Result<Self> {
        let raw_response = row
            .raw_response
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(AiGeneration {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            prompt: row.prompt,
            model: row.model,
            raw_response,
            status: parse_enum(&row.status)?,
            error_code: row.error_code,
            created_at: parse_ts(&row.created_at)?,
            completed_at: parse_opt_ts(row.completed_at)?,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct GeneratedCardRow {
    pub id: String,
    pub user_id: String,
    pub generation_id: String,
    pub question: String,
    pub answer: String,
    pub accepted: bool,
    pub accepted_at: Option<String>,
    pub card_id: Option<String>,
    pub created_at: String,
}

impl TryFrom<GeneratedCardRow> for AiGeneratedCard {
    type Error = Error;

    fn try_from(row: GeneratedCardRow) -> Result<Self> {
        Ok(AiGeneratedCard {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            generation_id: parse_id(&row.generation_id)?,
            question: row.question,
            answer: row.answer,
            accepted: row.accepted,
            accepted_at: parse_opt_ts(row.accepted_at)?,
            card_id: parse_opt_id(row.card_id)?,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct AttemptRow {
    pub id: String,
    pub user_id: String,
    pub generation_id: Option<String>,
    pub status: String,
    pub error_code: Option<String>,
    pub advisory_lock_key: i64,
    pub created_at: String,
}

impl TryFrom<AttemptRow> for GenerationAttempt {
    type Error = Error;

    fn try_from(row: AttemptRow) -> Result<Self> {
        Ok(GenerationAttempt {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            generation_id: parse_opt_id(row.generation_id)?,
            status: parse_enum(&row.status)?,
            error_code: row.error_code,
            advisory_lock_key: row.advisory_lock_key,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct IssueRow {
    pub id: String,
    pub user_id: String,
    pub card_id: String,
    pub description: String,
    pub status: String,
    pub resolution_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<IssueRow> for CardIssueReport {
    type Error = Error;

    fn try_from(row: IssueRow) -> Result<Self> {
        Ok(CardIssueReport {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            card_id: parse_id(&row.card_id)?,
            description: row.description,
            status: parse_enum(&row.status)?,
            resolution_notes: row.resolution_notes,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_ts_is_fixed_width_and_ordered() {
        let a = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let b = a + Duration::nanoseconds(1500);
        let c = a + Duration::hours(10);

        assert_eq!(ts(&a).len(), ts(&b).len());
        assert_eq!(ts(&a).len(), ts(&c).len());
        assert!(ts(&a) < ts(&b));
        assert!(ts(&b) < ts(&c));
    }

    #[test]
    fn test_ts_round_trip() {
        let now = Utc::now();
        assert_eq!(parse_ts(&ts(&now)).unwrap(), now);
    }

    #[test]
    fn test_bad_values_are_serialization_errors() {
        assert!(matches!(parse_id("nope"), Err(Error::Serialization(_))));
        assert!(matches!(parse_ts("yesterday"), Err(Error::Serialization(_))));
        assert!(matches!(
            parse_enum::<flashdeck_core::CardOrigin>("scanned"),
            Err(Error::Serialization(_))
        ));
    }
}
