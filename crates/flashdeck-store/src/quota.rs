//! Generation attempt log and the per-user quota tracker

use chrono::{DateTime, Utc};
use flashdeck_core::{GenerationAttempt, QuotaCheck, QuotaPolicy};
use sqlx::{Executor, Sqlite};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::rows::{parse_ts, ts, AttemptRow};
use crate::store::Store;

pub(crate) async fn insert_attempt<'e, E>(executor: E, attempt: &GenerationAttempt) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO ai_generation_attempts (
            id, user_id, generation_id, status, error_code, advisory_lock_key, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(attempt.id.to_string())
    .bind(attempt.user_id.to_string())
    .bind(attempt.generation_id.map(|id| id.to_string()))
    .bind(attempt.status.as_str())
    .bind(&attempt.error_code)
    .bind(attempt.advisory_lock_key)
    .bind(ts(&attempt.created_at))
    .execute(executor)
    .await?;
    Ok(())
}

impl Store {
    /// Append an attempt row
    #[instrument(skip(self, attempt), fields(attempt_id = %attempt.id, status = %attempt.status))]
    pub async fn record_attempt(&self, attempt: &GenerationAttempt) -> Result<()> {
        insert_attempt(self.pool(), attempt).await
    }

    /// Creation times of a user's successful attempts since `since`, oldest first
    #[instrument(skip(self))]
    pub async fn successful_attempt_times(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT created_at FROM ai_generation_attempts
            WHERE user_id = ?1 AND status = 'succeeded' AND created_at >= ?2
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id.to_string())
        .bind(ts(&since))
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(|(at,)| parse_ts(at)).collect()
    }

    /// Most recent attempts of a user, newest first
    #[instrument(skip(self))]
    pub async fn recent_attempts(&self, user_id: Uuid, limit: i64) -> Result<Vec<GenerationAttempt>> {
        let rows: Vec<AttemptRow> = sqlx::query_as(
            r#"
            SELECT * FROM ai_generation_attempts
            WHERE user_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(GenerationAttempt::try_from).collect()
    }
}

/// Answers "may this user generate now?" and records attempts
#[derive(Clone)]
pub struct QuotaTracker {
    store: Store,
    policy: QuotaPolicy,
}

impl QuotaTracker {
    /// Create a tracker over `store` enforcing `policy`
    #[must_use]
    pub fn new(store: Store, policy: QuotaPolicy) -> Self {
        Self { store, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Current quota state for `user_id` at `now`
    ///
    /// Only successful attempts inside the trailing window count. Read failures
    /// propagate.
    #[instrument(skip(self))]
    pub async fn check(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<QuotaCheck> {
        let since = self.policy.window_start(now);
        let succeeded = self.store.successful_attempt_times(user_id, since).await?;
        let check = self.policy.evaluate(succeeded, now);

        debug!(
            used = check.used,
            remaining = check.remaining,
            allowed = check.allowed,
            "Quota checked"
        );
        Ok(check)
    }

    /// Record a successful attempt without the quota guard
    ///
    /// The generate flow records success through
    /// [`Store::persist_generation`]; this is for callers that persist
    /// generations themselves.
    pub async fn record_successful_attempt(&self, user_id: Uuid, generation_id: Uuid) -> Result<()> {
        self.store
            .record_attempt(&GenerationAttempt::succeeded(user_id, generation_id))
            .await
    }

    /// Record a failed attempt. Write errors are logged and swallowed.
    pub async fn record_failed_attempt(&self, user_id: Uuid, error_code: &str) {
        let attempt = GenerationAttempt::failed(user_id, error_code);
        if let Err(e) = self.store.record_attempt(&attempt).await {
            error!(%user_id, error_code, error = %e, "Failed to record failed generation attempt");
        }
    }
}
