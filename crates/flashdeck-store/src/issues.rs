//! Card issue reports

use flashdeck_core::CardIssueReport;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::rows::{ts, IssueRow};
use crate::store::Store;

impl Store {
    /// File a report against one of the user's cards
    #[instrument(skip(self, report), fields(report_id = %report.id, card_id = %report.card_id))]
    pub async fn create_issue(&self, report: &CardIssueReport) -> Result<()> {
        self.get_card(report.user_id, report.card_id).await?;

        sqlx::query(
            r#"
            INSERT INTO card_issue_reports (
                id, user_id, card_id, description, status, resolution_notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(report.id.to_string())
        .bind(report.user_id.to_string())
        .bind(report.card_id.to_string())
        .bind(&report.description)
        .bind(report.status.as_str())
        .bind(&report.resolution_notes)
        .bind(ts(&report.created_at))
        .bind(ts(&report.updated_at))
        .execute(self.pool())
        .await?;

        info!("Card issue reported");
        Ok(())
    }

    /// Reports filed against a card, newest first
    #[instrument(skip(self))]
    pub async fn list_issues(&self, user_id: Uuid, card_id: Uuid) -> Result<Vec<CardIssueReport>> {
        self.get_card(user_id, card_id).await?;

        let rows: Vec<IssueRow> = sqlx::query_as(
            r#"
            SELECT * FROM card_issue_reports
            WHERE card_id = ?1 AND user_id = ?2
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(card_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(CardIssueReport::try_from).collect()
    }
}
