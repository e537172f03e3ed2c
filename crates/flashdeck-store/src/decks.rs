//! Deck persistence

use chrono::{DateTime, Utc};
use flashdeck_core::{Deck, DeckStats};
use sqlx::{Executor, FromRow, Sqlite};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::rows::{ts, DeckRow};
use crate::store::Store;

const DECK_WITH_STATS: &str = r#"
    SELECT d.id, d.user_id, d.name, d.description, d.created_at, d.updated_at,
        (SELECT COUNT(*) FROM cards c WHERE c.deck_id = d.id) AS cards_total,
        (SELECT COUNT(*) FROM cards c WHERE c.deck_id = d.id AND c.due_at <= ?2) AS due_count
    FROM decks d
"#;

#[derive(FromRow)]
struct DeckStatsRow {
    #[sqlx(flatten)]
    deck: DeckRow,
    cards_total: i64,
    due_count: i64,
}

impl DeckStatsRow {
    fn into_parts(self) -> Result<(Deck, DeckStats)> {
        let deck = Deck::try_from(self.deck)?;
        let stats = DeckStats {
            deck_id: deck.id,
            cards_total: self.cards_total,
            due_count: self.due_count,
        };
        Ok((deck, stats))
    }
}

pub(crate) async fn insert_deck<'e, E>(executor: E, deck: &Deck) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO decks (id, user_id, name, description, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(deck.id.to_string())
    .bind(deck.user_id.to_string())
    .bind(&deck.name)
    .bind(&deck.description)
    .bind(ts(&deck.created_at))
    .bind(ts(&deck.updated_at))
    .execute(executor)
    .await?;
    Ok(())
}

impl Store {
    /// Insert a new deck
    #[instrument(skip(self, deck), fields(deck_id = %deck.id))]
    pub async fn create_deck(&self, deck: &Deck) -> Result<()> {
        insert_deck(self.pool(), deck).await?;
        debug!("Created deck");
        Ok(())
    }

    /// Load a deck owned by `user_id`
    #[instrument(skip(self))]
    pub async fn get_deck(&self, user_id: Uuid, deck_id: Uuid) -> Result<Deck> {
        let row: Option<DeckRow> =
            sqlx::query_as("SELECT * FROM decks WHERE id = ?1 AND user_id = ?2")
                .bind(deck_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(self.pool())
                .await?;

        row.ok_or_else(|| Error::not_found("deck", deck_id))?
            .try_into()
    }

    /// Load a deck together with its card counts at `now`
    #[instrument(skip(self))]
    pub async fn get_deck_with_stats(
        &self,
        user_id: Uuid,
        deck_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Deck, DeckStats)> {
        let sql = format!("{DECK_WITH_STATS} WHERE d.id = ?1 AND d.user_id = ?3");
        let row: Option<DeckStatsRow> = sqlx::query_as(&sql)
            .bind(deck_id.to_string())
            .bind(ts(&now))
            .bind(user_id.to_string())
            .fetch_optional(self.pool())
            .await?;

        row.ok_or_else(|| Error::not_found("deck", deck_id))?
            .into_parts()
    }

    /// List a user's decks, newest first, with the total deck count
    #[instrument(skip(self))]
    pub async fn list_decks(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
        now: DateTime<Utc>,
    ) -> Result<(Vec<(Deck, DeckStats)>, i64)> {
        let sql = format!(
            "{DECK_WITH_STATS} WHERE d.user_id = ?1 ORDER BY d.created_at DESC, d.id LIMIT ?3 OFFSET ?4"
        );
        let rows: Vec<DeckStatsRow> = sqlx::query_as(&sql)
            .bind(user_id.to_string())
            .bind(ts(&now))
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM decks WHERE user_id = ?1")
            .bind(user_id.to_string())
            .fetch_one(self.pool())
            .await?;

        let decks = rows
            .into_iter()
            .map(DeckStatsRow::into_parts)
            .collect::<Result<Vec<_>>>()?;
        Ok((decks, total))
    }

    /// Persist a deck's name, description and `updated_at`
    #[instrument(skip(self, deck), fields(deck_id = %deck.id))]
    pub async fn update_deck(&self, deck: &Deck) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE decks SET name = ?1, description = ?2, updated_at = ?3
            WHERE id = ?4 AND user_id = ?5
            "#,
        )
        .bind(&deck.name)
        .bind(&deck.description)
        .bind(ts(&deck.updated_at))
        .bind(deck.id.to_string())
        .bind(deck.user_id.to_string())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("deck", deck.id));
        }
        Ok(())
    }

    /// Delete a deck; its cards, sessions and reviews go with it
    #[instrument(skip(self))]
    pub async fn delete_deck(&self, user_id: Uuid, deck_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM decks WHERE id = ?1 AND user_id = ?2")
            .bind(deck_id.to_string())
            .bind(user_id.to_string())
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("deck", deck_id));
        }
        debug!("Deleted deck");
        Ok(())
    }
}
