//! Study sessions and review application

use chrono::{DateTime, Utc};
use flashdeck_core::{Card, CardReview, LeitnerSchedule, ReviewResult, StudySession};
use sqlx::{Executor, Sqlite};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::cards::fetch_card;
use crate::error::{Error, Result};
use crate::rows::{ts, CardRow, ReviewRow, SessionRow};
use crate::store::Store;

/// A review request against an active session
#[derive(Debug, Clone, Copy)]
pub struct ReviewInput {
    pub card_id: Uuid,
    pub result: ReviewResult,
    pub response_ms: Option<i64>,
}

async fn fetch_session<'e, E>(executor: E, user_id: Uuid, session_id: Uuid) -> Result<StudySession>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<SessionRow> =
        sqlx::query_as("SELECT * FROM study_sessions WHERE id = ?1 AND user_id = ?2")
            .bind(session_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(executor)
            .await?;

    row.ok_or_else(|| Error::not_found("study session", session_id))?
        .try_into()
}

async fn count_due<'e, E>(executor: E, deck_id: Uuid, now: DateTime<Utc>) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM cards WHERE deck_id = ?1 AND due_at <= ?2")
            .bind(deck_id.to_string())
            .bind(ts(&now))
            .fetch_one(executor)
            .await?;
    Ok(count)
}

impl Store {
    /// Start a session on one of the user's decks; returns it with the due count
    #[instrument(skip(self))]
    pub async fn start_session(
        &self,
        user_id: Uuid,
        deck_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(StudySession, i64)> {
        let deck = self.get_deck(user_id, deck_id).await?;
        let mut session = StudySession::start(user_id, deck.id);
        session.started_at = now;

        sqlx::query(
            r#"
            INSERT INTO study_sessions (
                id, user_id, deck_id, started_at, ended_at,
                cards_reviewed, know_count, dont_know_count
            ) VALUES (?1, ?2, ?3, ?4, NULL, 0, 0, 0)
            "#,
        )
        .bind(session.id.to_string())
        .bind(user_id.to_string())
        .bind(deck.id.to_string())
        .bind(ts(&session.started_at))
        .execute(self.pool())
        .await?;

        let due = count_due(self.pool(), deck.id, now).await?;
        info!(session_id = %session.id, due, "Study session started");
        Ok((session, due))
    }

    /// Load a session owned by `user_id`
    #[instrument(skip(self))]
    pub async fn get_session(&self, user_id: Uuid, session_id: Uuid) -> Result<StudySession> {
        fetch_session(self.pool(), user_id, session_id).await
    }

    /// Due cards of the session's deck, oldest due first, plus how many more are due
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn due_cards(
        &self,
        session: &StudySession,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Card>, i64)> {
        let rows: Vec<CardRow> = sqlx::query_as(
            r#"
            SELECT * FROM cards
            WHERE deck_id = ?1 AND user_id = ?2 AND due_at <= ?3
            ORDER BY due_at ASC, id
            LIMIT ?4
            "#,
        )
        .bind(session.deck_id.to_string())
        .bind(session.user_id.to_string())
        .bind(ts(&now))
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        let cards = rows
            .into_iter()
            .map(Card::try_from)
            .collect::<Result<Vec<_>>>()?;

        let due = count_due(self.pool(), session.deck_id, now).await?;
        let remaining = (due - cards.len() as i64).max(0);
        Ok((cards, remaining))
    }

    /// Apply one review: card state, review row and session counters in one transaction
    #[instrument(skip(self, schedule, input), fields(card_id = %input.card_id, result = %input.result))]
    pub async fn apply_review(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        input: ReviewInput,
        schedule: &LeitnerSchedule,
        now: DateTime<Utc>,
    ) -> Result<(CardReview, Card)> {
        let mut tx = self.pool().begin().await?;

        // Writing first takes the database write lock before anything is read.
        let (know, dont_know) = match input.result {
            ReviewResult::Know => (1_i64, 0_i64),
            ReviewResult::DontKnow => (0, 1),
        };
        let counted = sqlx::query(
            r#"
            UPDATE study_sessions SET
                cards_reviewed = cards_reviewed + 1,
                know_count = know_count + ?1,
                dont_know_count = dont_know_count + ?2
            WHERE id = ?3 AND user_id = ?4 AND ended_at IS NULL
            "#,
        )
        .bind(know)
        .bind(dont_know)
        .bind(session_id.to_string())
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;

        let session = fetch_session(&mut *tx, user_id, session_id).await?;
        if counted.rows_affected() == 0 {
            return Err(Error::Conflict("study session has already ended".to_string()));
        }

        let mut card = fetch_card(&mut *tx, user_id, input.card_id).await?;
        if card.deck_id != session.deck_id {
            return Err(Error::not_found("card", input.card_id));
        }

        let transition = schedule.transition(card.leitner_box, input.result, now);
        card.leitner_box = transition.new_box;
        card.due_at = transition.due_at;
        card.last_reviewed_at = Some(now);
        card.updated_at = now;

        sqlx::query(
            r#"
            UPDATE cards SET leitner_box = ?1, due_at = ?2, last_reviewed_at = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(i64::from(card.leitner_box))
        .bind(ts(&card.due_at))
        .bind(ts(&now))
        .bind(ts(&now))
        .bind(card.id.to_string())
        .execute(&mut *tx)
        .await?;

        let review = CardReview {
            id: Uuid::new_v4(),
            user_id,
            session_id,
            card_id: card.id,
            result: input.result,
            prev_box: transition.previous,
            new_box: transition.new_box,
            response_ms: input.response_ms,
            reviewed_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO card_reviews (
                id, user_id, session_id, card_id, result,
                prev_box, new_box, response_ms, reviewed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(review.id.to_string())
        .bind(user_id.to_string())
        .bind(session_id.to_string())
        .bind(card.id.to_string())
        .bind(review.result.as_str())
        .bind(i64::from(review.prev_box))
        .bind(i64::from(review.new_box))
        .bind(review.response_ms)
        .bind(ts(&review.reviewed_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            prev_box = %review.prev_box,
            new_box = %review.new_box,
            "Review applied"
        );
        Ok((review, card))
    }

    /// Reviews recorded in a session, in order
    #[instrument(skip(self))]
    pub async fn session_reviews(&self, user_id: Uuid, session_id: Uuid) -> Result<Vec<CardReview>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r#"
            SELECT * FROM card_reviews
            WHERE session_id = ?1 AND user_id = ?2
            ORDER BY reviewed_at ASC, id
            "#,
        )
        .bind(session_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(CardReview::try_from).collect()
    }

    /// Mark a session ended. Ending it twice is a conflict.
    #[instrument(skip(self))]
    pub async fn end_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<StudySession> {
        let result = sqlx::query(
            "UPDATE study_sessions SET ended_at = ?1 WHERE id = ?2 AND user_id = ?3 AND ended_at IS NULL",
        )
        .bind(ts(&now))
        .bind(session_id.to_string())
        .bind(user_id.to_string())
        .execute(self.pool())
        .await?;

        let session = fetch_session(self.pool(), user_id, session_id).await?;
        if result.rows_affected() == 0 {
            return Err(Error::Conflict("study session has already ended".to_string()));
        }

        info!(
            session_id = %session.id,
            reviewed = session.cards_reviewed,
            "Study session ended"
        );
        Ok(session)
    }
}
