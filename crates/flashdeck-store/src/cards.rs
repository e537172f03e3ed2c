//! Card persistence

use flashdeck_core::Card;
use sqlx::{Executor, Sqlite};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::rows::{ts, CardRow};
use crate::store::Store;

pub(crate) const DUPLICATE_QUESTION: &str = "a card with this question already exists in the deck";

pub(crate) async fn insert_card<'e, E>(executor: E, card: &Card) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO cards (
            id, user_id, deck_id, question, answer, question_normalized,
            origin, leitner_box, due_at, last_reviewed_at, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(card.id.to_string())
    .bind(card.user_id.to_string())
    .bind(card.deck_id.to_string())
    .bind(&card.question)
    .bind(&card.answer)
    .bind(&card.question_normalized)
    .bind(card.origin.as_str())
    .bind(i64::from(card.leitner_box))
    .bind(ts(&card.due_at))
    .bind(card.last_reviewed_at.as_ref().map(ts))
    .bind(ts(&card.created_at))
    .bind(ts(&card.updated_at))
    .execute(executor)
    .await
    .map_err(|e| Error::unique_or(e, DUPLICATE_QUESTION))?;
    Ok(())
}

pub(crate) async fn fetch_card<'e, E>(executor: E, user_id: Uuid, card_id: Uuid) -> Result<Card>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<CardRow> = sqlx::query_as("SELECT * FROM cards WHERE id = ?1 AND user_id = ?2")
        .bind(card_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(executor)
        .await?;

    row.ok_or_else(|| Error::not_found("card", card_id))?
        .try_into()
}

impl Store {
    /// Insert a card. A duplicate question in the same deck is a conflict.
    #[instrument(skip(self, card), fields(card_id = %card.id, deck_id = %card.deck_id))]
    pub async fn create_card(&self, card: &Card) -> Result<()> {
        insert_card(self.pool(), card).await?;
        debug!("Created card");
        Ok(())
    }

    /// Load a card owned by `user_id`
    #[instrument(skip(self))]
    pub async fn get_card(&self, user_id: Uuid, card_id: Uuid) -> Result<Card> {
        fetch_card(self.pool(), user_id, card_id).await
    }

    /// List a deck's cards in creation order, with the deck's card count
    #[instrument(skip(self))]
    pub async fn list_cards(
        &self,
        user_id: Uuid,
        deck_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Card>, i64)> {
        let rows: Vec<CardRow> = sqlx::query_as(
            r#"
            SELECT * FROM cards
            WHERE deck_id = ?1 AND user_id = ?2
            ORDER BY created_at ASC, id
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(deck_id.to_string())
        .bind(user_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM cards WHERE deck_id = ?1 AND user_id = ?2")
                .bind(deck_id.to_string())
                .bind(user_id.to_string())
                .fetch_one(self.pool())
                .await?;

        let cards = rows
            .into_iter()
            .map(Card::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((cards, total))
    }

    /// Persist a card's content and review state
    #[instrument(skip(self, card), fields(card_id = %card.id))]
    pub async fn update_card(&self, card: &Card) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE cards SET
                question = ?1, answer = ?2, question_normalized = ?3,
                leitner_box = ?4, due_at = ?5, last_reviewed_at = ?6, updated_at = ?7
            WHERE id = ?8 AND user_id = ?9
            "#,
        )
        .bind(&card.question)
        .bind(&card.answer)
        .bind(&card.question_normalized)
        .bind(i64::from(card.leitner_box))
        .bind(ts(&card.due_at))
        .bind(card.last_reviewed_at.as_ref().map(ts))
        .bind(ts(&card.updated_at))
        .bind(card.id.to_string())
        .bind(card.user_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| Error::unique_or(e, DUPLICATE_QUESTION))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("card", card.id));
        }
        Ok(())
    }

    /// Delete a card with its reviews and issue reports
    #[instrument(skip(self))]
    pub async fn delete_card(&self, user_id: Uuid, card_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM cards WHERE id = ?1 AND user_id = ?2")
            .bind(card_id.to_string())
            .bind(user_id.to_string())
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("card", card_id));
        }
        debug!("Deleted card");
        Ok(())
    }
}
