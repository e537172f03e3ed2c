//! Domain entities
//!
//! Field names follow the persisted (snake_case) columns. The camelCase API
//! shapes live in [`crate::dto`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::leitner::LeitnerBox;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Returns the string representation
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("unknown ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

string_enum! {
    /// Where a card came from
    pub enum CardOrigin {
        /// Written by the user
        Manual => "manual",
        /// Accepted from an AI generation
        Ai => "ai",
    }
}

string_enum! {
    /// Outcome of a single card review
    pub enum ReviewResult {
        /// The user recalled the answer
        Know => "know",
        /// The user did not recall the answer
        DontKnow => "dont_know",
    }
}

string_enum! {
    /// Status of a generation or a generation attempt
    pub enum GenerationStatus {
        /// Generation completed and was persisted
        Succeeded => "succeeded",
        /// Generation failed before completion
        Failed => "failed",
    }
}

string_enum! {
    /// Lifecycle of a card issue report
    pub enum IssueStatus {
        /// Newly filed
        Open => "open",
        /// Being looked at
        InReview => "in_review",
        /// Fixed
        Resolved => "resolved",
        /// Rejected
        Dismissed => "dismissed",
    }
}

/// A deck of cards owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    /// Create a new deck
    pub fn new(user_id: Uuid, name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregate counts for a deck, computed at read time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStats {
    pub deck_id: Uuid,
    pub cards_total: i64,
    pub due_count: i64,
}

/// A flashcard with its Leitner review state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub user_id: Uuid,
    pub deck_id: Uuid,
    pub question: String,
    pub answer: String,
    pub question_normalized: String,
    pub origin: CardOrigin,
    pub leitner_box: LeitnerBox,
    pub due_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Create a new card in box 1, due immediately
    pub fn new(
        user_id: Uuid,
        deck_id: Uuid,
        question: impl Into<String>,
        answer: impl Into<String>,
        origin: CardOrigin,
    ) -> Self {
        let now = Utc::now();
        let question = question.into();
        Self {
            id: Uuid::new_v4(),
            user_id,
            deck_id,
            question_normalized: normalize_question(&question),
            question,
            answer: answer.into(),
            origin,
            leitner_box: LeitnerBox::FIRST,
            due_at: now,
            last_reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace question and/or answer. Any content change restarts learning.
    pub fn edit(&mut self, question: Option<String>, answer: Option<String>, now: DateTime<Utc>) {
        if let Some(question) = question {
            self.question_normalized = normalize_question(&question);
            self.question = question;
        }
        if let Some(answer) = answer {
            self.answer = answer;
        }
        self.leitner_box = LeitnerBox::FIRST;
        self.due_at = now;
        self.updated_at = now;
    }

    /// Whether the card should be shown at `now`
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}

/// Key used to detect duplicate questions within a deck
#[must_use]
pub fn normalize_question(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A study session over one deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub deck_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub cards_reviewed: i64,
    pub know_count: i64,
    pub dont_know_count: i64,
}

impl StudySession {
    /// Start a session now
    pub fn start(user_id: Uuid, deck_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            deck_id,
            started_at: Utc::now(),
            ended_at: None,
            cards_reviewed: 0,
            know_count: 0,
            dont_know_count: 0,
        }
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Count one review in the aggregate counters
    pub fn tally(&mut self, result: ReviewResult) {
        self.cards_reviewed += 1;
        match result {
            ReviewResult::Know => self.know_count += 1,
            ReviewResult::DontKnow => self.dont_know_count += 1,
        }
    }

    /// Whole seconds between start and end (or `now` while running)
    #[must_use]
    pub fn duration_seconds(&self, now: DateTime<Utc>) -> i64 {
        let end = self.ended_at.unwrap_or(now);
        (end - self.started_at).num_seconds().max(0)
    }
}

/// One review inside a study session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardReview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub card_id: Uuid,
    pub result: ReviewResult,
    pub prev_box: LeitnerBox,
    pub new_box: LeitnerBox,
    pub response_ms: Option<i64>,
    pub reviewed_at: DateTime<Utc>,
}

/// A single AI generation request and its raw output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiGeneration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub model: Option<String>,
    pub raw_response: Option<serde_json::Value>,
    pub status: GenerationStatus,
    pub error_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AiGeneration {
    /// A completed generation
    pub fn succeeded(
        user_id: Uuid,
        prompt: impl Into<String>,
        model: impl Into<String>,
        raw_response: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            prompt: prompt.into(),
            model: Some(model.into()),
            raw_response: Some(raw_response),
            status: GenerationStatus::Succeeded,
            error_code: None,
            created_at: now,
            completed_at: Some(now),
        }
    }
}

/// A card proposed by an AI generation, pending acceptance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiGeneratedCard {
    pub id: Uuid,
    pub user_id: Uuid,
    pub generation_id: Uuid,
    pub question: String,
    pub answer: String,
    pub accepted: bool,
    pub accepted_at: Option<DateTime<Utc>>,
    pub card_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl AiGeneratedCard {
    /// A fresh, unaccepted proposal. Question and answer are trimmed.
    pub fn new(user_id: Uuid, generation_id: Uuid, question: &str, answer: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            generation_id,
            question: question.trim().to_string(),
            answer: answer.trim().to_string(),
            accepted: false,
            accepted_at: None,
            card_id: None,
            created_at: Utc::now(),
        }
    }
}

/// One recorded generation attempt, counted by the quota tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub generation_id: Option<Uuid>,
    pub status: GenerationStatus,
    pub error_code: Option<String>,
    pub advisory_lock_key: i64,
    pub created_at: DateTime<Utc>,
}

impl GenerationAttempt {
    /// A successful attempt linked to its generation
    pub fn succeeded(user_id: Uuid, generation_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            generation_id: Some(generation_id),
            status: GenerationStatus::Succeeded,
            error_code: None,
            advisory_lock_key: crate::quota::advisory_lock_key(&user_id.to_string()),
            created_at: Utc::now(),
        }
    }

    /// A failed attempt with the error code that caused it
    pub fn failed(user_id: Uuid, error_code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            generation_id: None,
            status: GenerationStatus::Failed,
            error_code: Some(error_code.into()),
            advisory_lock_key: crate::quota::advisory_lock_key(&user_id.to_string()),
            created_at: Utc::now(),
        }
    }
}

/// A user-reported problem with a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardIssueReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub card_id: Uuid,
    pub description: String,
    pub status: IssueStatus,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CardIssueReport {
    /// File a new open report
    pub fn open(user_id: Uuid, card_id: Uuid, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            card_id,
            description: description.into(),
            status: IssueStatus::Open,
            resolution_notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}
