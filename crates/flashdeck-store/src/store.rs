//! Store - SQLite connection pool and schema

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::Result;

/// Default database file name inside the data directory
pub const DEFAULT_DB_FILE: &str = "flashdeck.db";

/// Default data directory (`<data dir>/flashdeck`, or `./data` when unknown)
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("flashdeck"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Default database path
#[must_use]
pub fn default_db_path() -> PathBuf {
    default_data_dir().join(DEFAULT_DB_FILE)
}

/// Handle to the flashcard database
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Wrap an existing pool. Migrations are not run.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `db_path` and run migrations
    pub async fn from_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        info!("SQLite store initialized at {}", db_path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub async fn in_memory() -> Result<Self> {
        // A single connection that never expires: the database lives and dies with it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    /// Get a reference to the underlying connection pool
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial query, returning the latency in milliseconds
    pub async fn ping(&self) -> Result<u128> {
        let started = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(started.elapsed().as_millis())
    }

    /// Create tables and indexes if they do not exist
    async fn run_migrations(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        debug!("Database migrations completed");
        Ok(())
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS decks (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cards (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        deck_id TEXT NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
        question TEXT NOT NULL,
        answer TEXT NOT NULL,
        question_normalized TEXT NOT NULL,
        origin TEXT NOT NULL,
        leitner_box INTEGER NOT NULL DEFAULT 1 CHECK (leitner_box BETWEEN 1 AND 3),
        due_at TEXT NOT NULL,
        last_reviewed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (deck_id, question_normalized)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS study_sessions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        deck_id TEXT NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
        started_at TEXT NOT NULL,
        ended_at TEXT,
        cards_reviewed INTEGER NOT NULL DEFAULT 0,
        know_count INTEGER NOT NULL DEFAULT 0,
        dont_know_count INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS card_reviews (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        session_id TEXT NOT NULL REFERENCES study_sessions(id) ON DELETE CASCADE,
        card_id TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
        result TEXT NOT NULL,
        prev_box INTEGER NOT NULL,
        new_box INTEGER NOT NULL,
        response_ms INTEGER,
        reviewed_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ai_generations (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        prompt TEXT NOT NULL,
        model TEXT,
        raw_response TEXT,
        status TEXT NOT NULL,
        error_code TEXT,
        created_at TEXT NOT NULL,
        completed_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ai_generated_cards (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        generation_id TEXT NOT NULL REFERENCES ai_generations(id) ON DELETE CASCADE,
        question TEXT NOT NULL,
        answer TEXT NOT NULL,
        accepted INTEGER NOT NULL DEFAULT 0,
        accepted_at TEXT,
        card_id TEXT REFERENCES cards(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ai_generation_attempts (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        generation_id TEXT,
        status TEXT NOT NULL,
        error_code TEXT,
        advisory_lock_key INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS card_issue_reports (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        card_id TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
        description TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'open',
        resolution_notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_decks_user ON decks(user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_cards_deck_due ON cards(deck_id, due_at)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_deck ON study_sessions(deck_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_session ON card_reviews(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_generated_cards_generation ON ai_generated_cards(generation_id)",
    "CREATE INDEX IF NOT EXISTS idx_attempts_user_window ON ai_generation_attempts(user_id, status, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_issues_card ON card_issue_reports(card_id, created_at DESC)",
];
