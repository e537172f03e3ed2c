//! API request commands and response DTOs
//!
//! DTOs are the camelCase wire shapes of the entities in [`crate::models`].
//! The mapping is one-to-one: fields are renamed, nothing is computed.
//! `from_dto` conversions rebuild entities from DTOs given the owner ids the
//! DTOs do not carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::leitner::LeitnerBox;
use crate::models::{
    normalize_question, AiGeneratedCard, Card, CardIssueReport, CardOrigin, Deck, DeckStats,
    GenerationStatus, IssueStatus, ReviewResult, StudySession,
};
use crate::quota::QuotaCheck;

// ============================================================================
// Commands (request bodies)
// ============================================================================

/// `POST /api/ai/generate`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateCardsCommand {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// `PATCH /api/ai/generated-cards/:cardId`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditGeneratedCardCommand {
    pub question: Option<String>,
    pub answer: Option<String>,
}

/// `POST /api/ai/generations/:generationId/accept`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptGeneratedCardsCommand {
    pub deck_name: String,
    pub deck_description: Option<String>,
    pub accepted_card_ids: Vec<Uuid>,
}

/// `POST /api/decks`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeckCommand {
    pub name: String,
    pub description: Option<String>,
}

/// `PATCH /api/decks/:deckId`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDeckCommand {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// `POST /api/decks/:deckId/cards`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCardCommand {
    pub question: String,
    pub answer: String,
}

/// `PATCH /api/cards/:cardId`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCardCommand {
    pub question: Option<String>,
    pub answer: Option<String>,
}

/// `POST /api/study-sessions/:sessionId/reviews`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewCommand {
    pub card_id: Uuid,
    pub result: ReviewResult,
    pub response_duration_ms: Option<i64>,
}

/// `POST /api/cards/:cardId/issues`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCardIssueCommand {
    pub description: String,
}

// ============================================================================
// AI generation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaDto {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl From<&QuotaCheck> for QuotaDto {
    fn from(check: &QuotaCheck) -> Self {
        Self {
            limit: check.limit,
            used: check.used,
            remaining: check.remaining,
            reset_at: check.reset_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGeneratedCardDto {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&AiGeneratedCard> for AiGeneratedCardDto {
    fn from(card: &AiGeneratedCard) -> Self {
        Self {
            id: card.id,
            question: card.question.clone(),
            answer: card.answer.clone(),
            accepted: card.accepted,
            accepted_at: card.accepted_at,
            card_id: card.card_id,
            created_at: card.created_at,
        }
    }
}

impl AiGeneratedCard {
    /// Rebuild a proposal from its DTO
    pub fn from_dto(dto: AiGeneratedCardDto, user_id: Uuid, generation_id: Uuid) -> Self {
        Self {
            id: dto.id,
            user_id,
            generation_id,
            question: dto.question,
            answer: dto.answer,
            accepted: dto.accepted,
            accepted_at: dto.accepted_at,
            card_id: dto.card_id,
            created_at: dto.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCardsResponseDto {
    pub generation_id: Uuid,
    pub status: GenerationStatus,
    pub cards: Vec<AiGeneratedCardDto>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetGeneratedCardsResponseDto {
    pub generation_id: Uuid,
    pub cards: Vec<AiGeneratedCardDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditGeneratedCardResponseDto {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub accepted: bool,
}

impl From<&AiGeneratedCard> for EditGeneratedCardResponseDto {
    fn from(card: &AiGeneratedCard) -> Self {
        Self {
            id: card.id,
            question: card.question.clone(),
            answer: card.answer.clone(),
            accepted: card.accepted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptGeneratedCardsResponseDto {
    pub deck: DeckWithStatsDto,
    pub accepted_count: usize,
}

// ============================================================================
// Decks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Deck> for DeckDto {
    fn from(deck: &Deck) -> Self {
        Self {
            id: deck.id,
            name: deck.name.clone(),
            description: deck.description.clone(),
            created_at: deck.created_at,
            updated_at: deck.updated_at,
        }
    }
}

impl Deck {
    /// Rebuild a deck from its DTO
    pub fn from_dto(dto: DeckDto, user_id: Uuid) -> Self {
        Self {
            id: dto.id,
            user_id,
            name: dto.name,
            description: dto.description,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckWithStatsDto {
    #[serde(flatten)]
    pub deck: DeckDto,
    pub cards_total: i64,
    pub due_count: i64,
}

impl DeckWithStatsDto {
    pub fn new(deck: &Deck, stats: &DeckStats) -> Self {
        Self {
            deck: DeckDto::from(deck),
            cards_total: stats.cards_total,
            due_count: stats.due_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationDto {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDecksResponseDto {
    pub decks: Vec<DeckWithStatsDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeckResponseDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Deck> for UpdateDeckResponseDto {
    fn from(deck: &Deck) -> Self {
        Self {
            id: deck.id,
            name: deck.name.clone(),
            description: deck.description.clone(),
            updated_at: deck.updated_at,
        }
    }
}

// ============================================================================
// Cards
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub origin: CardOrigin,
    pub leitner_box: LeitnerBox,
    pub due_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Card> for CardDto {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            question: card.question.clone(),
            answer: card.answer.clone(),
            origin: card.origin,
            leitner_box: card.leitner_box,
            due_at: card.due_at,
            last_reviewed_at: card.last_reviewed_at,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

impl Card {
    /// Rebuild a card from its DTO. The normalized question is re-derived.
    pub fn from_dto(dto: CardDto, user_id: Uuid, deck_id: Uuid) -> Self {
        Self {
            id: dto.id,
            user_id,
            deck_id,
            question_normalized: normalize_question(&dto.question),
            question: dto.question,
            answer: dto.answer,
            origin: dto.origin,
            leitner_box: dto.leitner_box,
            due_at: dto.due_at,
            last_reviewed_at: dto.last_reviewed_at,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCardsResponseDto {
    pub cards: Vec<CardDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardResponseDto {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub leitner_box: LeitnerBox,
    pub due_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Card> for UpdateCardResponseDto {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            question: card.question.clone(),
            answer: card.answer.clone(),
            leitner_box: card.leitner_box,
            due_at: card.due_at,
            last_reviewed_at: card.last_reviewed_at,
            updated_at: card.updated_at,
        }
    }
}

// ============================================================================
// Study sessions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartStudySessionResponseDto {
    pub session_id: Uuid,
    pub deck_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub due_cards_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySessionDto {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub cards_reviewed: i64,
    pub know_count: i64,
    pub dont_know_count: i64,
}

impl From<&StudySession> for StudySessionDto {
    fn from(session: &StudySession) -> Self {
        Self {
            id: session.id,
            deck_id: session.deck_id,
            started_at: session.started_at,
            ended_at: session.ended_at,
            cards_reviewed: session.cards_reviewed,
            know_count: session.know_count,
            dont_know_count: session.dont_know_count,
        }
    }
}

impl StudySession {
    /// Rebuild a session from its DTO
    pub fn from_dto(dto: StudySessionDto, user_id: Uuid) -> Self {
        Self {
            id: dto.id,
            user_id,
            deck_id: dto.deck_id,
            started_at: dto.started_at,
            ended_at: dto.ended_at,
            cards_reviewed: dto.cards_reviewed,
            know_count: dto.know_count,
            dont_know_count: dto.dont_know_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyCardDto {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub leitner_box: LeitnerBox,
    pub due_at: DateTime<Utc>,
}

impl From<&Card> for StudyCardDto {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            question: card.question.clone(),
            answer: card.answer.clone(),
            leitner_box: card.leitner_box,
            due_at: card.due_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDueCardsResponseDto {
    pub cards: Vec<StudyCardDto>,
    pub remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewResponseDto {
    pub review_id: Uuid,
    pub card_id: Uuid,
    pub result: ReviewResult,
    pub previous_box: LeitnerBox,
    pub new_box: LeitnerBox,
    pub new_due_at: DateTime<Utc>,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionResponseDto {
    #[serde(flatten)]
    pub session: StudySessionDto,
    pub duration_seconds: i64,
}

// ============================================================================
// Issue reports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardIssueReportDto {
    pub id: Uuid,
    pub card_id: Uuid,
    pub description: String,
    pub status: IssueStatus,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CardIssueReport> for CardIssueReportDto {
    fn from(report: &CardIssueReport) -> Self {
        Self {
            id: report.id,
            card_id: report.card_id,
            description: report.description.clone(),
            status: report.status,
            resolution_notes: report.resolution_notes.clone(),
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

impl CardIssueReport {
    /// Rebuild a report from its DTO
    pub fn from_dto(dto: CardIssueReportDto, user_id: Uuid) -> Self {
        Self {
            id: dto.id,
            user_id,
            card_id: dto.card_id,
            description: dto.description,
            status: dto.status,
            resolution_notes: dto.resolution_notes,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListIssuesResponseDto {
    pub issues: Vec<CardIssueReportDto>,
}

// ============================================================================
// Errors
// ============================================================================

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorDto {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}
