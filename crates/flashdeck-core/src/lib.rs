//! Flashdeck Core - domain model and scheduling rules
//!
//! This crate holds the logic that does not touch storage:
//! - Models: decks, cards, sessions, reviews, generations, attempts, issues
//! - Leitner: three-box review transitions
//! - Quota: rolling-window limit on AI generations
//! - Validation: command input rules
//! - DTO: camelCase API shapes and entity mapping

#![forbid(unsafe_code)]

pub mod dto;
pub mod error;
pub mod leitner;
pub mod models;
pub mod quota;
pub mod validation;

pub use error::{Error, ErrorCode, Result};
pub use leitner::{LeitnerBox, LeitnerSchedule, Transition};
pub use models::{
    AiGeneratedCard, AiGeneration, Card, CardIssueReport, CardOrigin, CardReview, Deck,
    DeckStats, GenerationAttempt, GenerationStatus, IssueStatus, ReviewResult, StudySession,
};
pub use quota::{advisory_lock_key, QuotaCheck, QuotaPolicy};
