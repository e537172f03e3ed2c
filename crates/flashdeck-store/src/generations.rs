//! AI generations, their proposed cards, and acceptance into decks

use chrono::{DateTime, Utc};
use flashdeck_core::models::normalize_question;
use flashdeck_core::{
    validation, AiGeneratedCard, AiGeneration, Card, CardOrigin, Deck, GenerationAttempt,
    QuotaPolicy,
};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cards::insert_card;
use crate::decks::insert_deck;
use crate::error::{Error, Result};
use crate::rows::{ts, GeneratedCardRow, GenerationRow};
use crate::store::Store;

impl Store {
    /// Persist a generation, its proposed cards and the successful attempt together
    ///
    /// The attempt row is only written while the user's successful attempts in
    /// the policy window stay below the limit. Otherwise nothing is persisted
    /// and [`Error::QuotaExceeded`] is returned.
    #[instrument(skip(self, generation, cards, policy), fields(generation_id = %generation.id, cards = cards.len()))]
    pub async fn persist_generation(
        &self,
        generation: &AiGeneration,
        cards: &[AiGeneratedCard],
        policy: &QuotaPolicy,
        now: DateTime<Utc>,
    ) -> Result<GenerationAttempt> {
        let raw_response = generation
            .raw_response
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO ai_generations (
                id, user_id, prompt, model, raw_response, status, error_code,
                created_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(generation.id.to_string())
        .bind(generation.user_id.to_string())
        .bind(&generation.prompt)
        .bind(&generation.model)
        .bind(raw_response)
        .bind(generation.status.as_str())
        .bind(&generation.error_code)
        .bind(ts(&generation.created_at))
        .bind(generation.completed_at.as_ref().map(ts))
        .execute(&mut *tx)
        .await?;

        let mut attempt = GenerationAttempt::succeeded(generation.user_id, generation.id);
        attempt.created_at = now;

        let inserted = sqlx::query(
            r#"
            INSERT INTO ai_generation_attempts (
                id, user_id, generation_id, status, error_code, advisory_lock_key, created_at
            )
            SELECT ?1, ?2, ?3, 'succeeded', NULL, ?4, ?5
            WHERE (
                SELECT COUNT(*) FROM ai_generation_attempts
                WHERE user_id = ?2 AND status = 'succeeded' AND created_at >= ?6
            ) < ?7
            "#,
        )
        .bind(attempt.id.to_string())
        .bind(attempt.user_id.to_string())
        .bind(generation.id.to_string())
        .bind(attempt.advisory_lock_key)
        .bind(ts(&attempt.created_at))
        .bind(ts(&policy.window_start(now)))
        .bind(i64::from(policy.limit))
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            warn!(user_id = %generation.user_id, "Quota exhausted while persisting generation");
            return Err(Error::QuotaExceeded);
        }

        for card in cards {
            sqlx::query(
                r#"
                INSERT INTO ai_generated_cards (
                    id, user_id, generation_id, question, answer,
                    accepted, accepted_at, card_id, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(card.id.to_string())
            .bind(card.user_id.to_string())
            .bind(generation.id.to_string())
            .bind(&card.question)
            .bind(&card.answer)
            .bind(card.accepted)
            .bind(card.accepted_at.as_ref().map(ts))
            .bind(card.card_id.map(|id| id.to_string()))
            .bind(ts(&card.created_at))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!("Generation persisted");
        Ok(attempt)
    }

    /// Load a generation owned by `user_id`
    #[instrument(skip(self))]
    pub async fn get_generation(&self, user_id: Uuid, generation_id: Uuid) -> Result<AiGeneration> {
        let row: Option<GenerationRow> =
            sqlx::query_as("SELECT * FROM ai_generations WHERE id = ?1 AND user_id = ?2")
                .bind(generation_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(self.pool())
                .await?;

        row.ok_or_else(|| Error::not_found("generation", generation_id))?
            .try_into()
    }

    /// Proposed cards of a generation, in the order they were generated
    #[instrument(skip(self))]
    pub async fn generated_cards(
        &self,
        user_id: Uuid,
        generation_id: Uuid,
    ) -> Result<Vec<AiGeneratedCard>> {
        self.get_generation(user_id, generation_id).await?;

        let rows: Vec<GeneratedCardRow> = sqlx::query_as(
            r#"
            SELECT * FROM ai_generated_cards
            WHERE generation_id = ?1 AND user_id = ?2
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(generation_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(AiGeneratedCard::try_from).collect()
    }

    /// Edit a proposed card that has not been accepted yet
    #[instrument(skip(self, question, answer))]
    pub async fn edit_generated_card(
        &self,
        user_id: Uuid,
        card_id: Uuid,
        question: Option<String>,
        answer: Option<String>,
    ) -> Result<AiGeneratedCard> {
        let row: Option<GeneratedCardRow> =
            sqlx::query_as("SELECT * FROM ai_generated_cards WHERE id = ?1 AND user_id = ?2")
                .bind(card_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(self.pool())
                .await?;
        let mut card: AiGeneratedCard = row
            .ok_or_else(|| Error::not_found("generated card", card_id))?
            .try_into()?;

        if card.accepted {
            return Err(Error::Conflict(
                "generated card has already been accepted".to_string(),
            ));
        }
        if let Some(question) = question {
            card.question = question;
        }
        if let Some(answer) = answer {
            card.answer = answer;
        }

        let result = sqlx::query(
            r#"
            UPDATE ai_generated_cards SET question = ?1, answer = ?2
            WHERE id = ?3 AND user_id = ?4 AND accepted = 0
            "#,
        )
        .bind(&card.question)
        .bind(&card.answer)
        .bind(card.id.to_string())
        .bind(user_id.to_string())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Conflict(
                "generated card has already been accepted".to_string(),
            ));
        }
        debug!("Generated card edited");
        Ok(card)
    }

    /// Create `deck` and copy the listed proposals of a generation into it
    ///
    /// Runs in one transaction. Ids that do not belong to the generation are a
    /// validation error. Proposals accepted earlier, and proposals repeating a
    /// question already taken from this batch, are skipped and stay pending.
    /// Returns the number of cards created.
    #[instrument(skip(self, deck, card_ids), fields(deck_id = %deck.id, requested = card_ids.len()))]
    pub async fn accept_generated_cards(
        &self,
        generation_id: Uuid,
        deck: &Deck,
        card_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let user_id = deck.user_id;
        self.get_generation(user_id, generation_id).await?;

        let mut tx = self.pool().begin().await?;
        insert_deck(&mut *tx, deck).await?;

        let rows: Vec<GeneratedCardRow> = sqlx::query_as(
            r#"
            SELECT * FROM ai_generated_cards
            WHERE generation_id = ?1 AND user_id = ?2
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(generation_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&mut *tx)
        .await?;
        let proposals = rows
            .into_iter()
            .map(AiGeneratedCard::try_from)
            .collect::<Result<Vec<_>>>()?;

        let requested: HashSet<Uuid> = card_ids.iter().copied().collect();
        let known: HashSet<Uuid> = proposals.iter().map(|card| card.id).collect();
        if let Some(unknown) = requested.difference(&known).next() {
            return Err(flashdeck_core::Error::validation(
                "acceptedCardIds",
                format!("card {unknown} does not belong to this generation"),
            )
            .into());
        }

        let mut accepted = 0;
        let mut questions = HashSet::new();
        for proposal in proposals
            .iter()
            .filter(|card| requested.contains(&card.id) && !card.accepted)
        {
            let question = validation::question(&proposal.question)?;
            let answer = validation::answer(&proposal.answer)?;
            if !questions.insert(normalize_question(&question)) {
                debug!(proposal_id = %proposal.id, "Skipping proposal with a repeated question");
                continue;
            }

            let mut card = Card::new(user_id, deck.id, question, answer, CardOrigin::Ai);
            card.due_at = now;
            card.created_at = now;
            card.updated_at = now;
            insert_card(&mut *tx, &card).await?;

            sqlx::query(
                "UPDATE ai_generated_cards SET accepted = 1, accepted_at = ?1, card_id = ?2 WHERE id = ?3",
            )
            .bind(ts(&now))
            .bind(card.id.to_string())
            .bind(proposal.id.to_string())
            .execute(&mut *tx)
            .await?;
            accepted += 1;
        }

        tx.commit().await?;

        info!(accepted, "Generated cards accepted");
        Ok(accepted)
    }
}
