//! Tests for the store

use super::*;
use chrono::{Duration, Utc};
use flashdeck_core::{
    validation, AiGeneratedCard, AiGeneration, Card, CardIssueReport, CardOrigin, Deck,
    GenerationAttempt, GenerationStatus, LeitnerBox, LeitnerSchedule, QuotaPolicy, ReviewResult,
};
use serde_json::json;
use uuid::Uuid;

async fn store_with_deck(user: Uuid) -> (Store, Deck) {
    let store = Store::in_memory().await.unwrap();
    let deck = Deck::new(user, "Rust", None);
    store.create_deck(&deck).await.unwrap();
    (store, deck)
}

async fn add_card(store: &Store, deck: &Deck, question: &str) -> Card {
    let card = Card::new(deck.user_id, deck.id, question, "answer", CardOrigin::Manual);
    store.create_card(&card).await.unwrap();
    card
}

async fn persist(store: &Store, user: Uuid, policy: &QuotaPolicy, cards: usize) -> Result<AiGeneration> {
    let generation = AiGeneration::succeeded(user, "ownership", "mock", json!({"cards": cards}));
    let proposals: Vec<_> = (0..cards)
        .map(|i| AiGeneratedCard::new(user, generation.id, &format!(" Q{i} "), &format!("A{i}")))
        .collect();
    store
        .persist_generation(&generation, &proposals, policy, Utc::now())
        .await?;
    Ok(generation)
}

#[test]
fn test_default_data_dir() {
    let dir = default_data_dir();
    assert!(dir.to_string_lossy().contains("flashdeck") || dir.ends_with("data"));
    assert!(default_db_path().ends_with("flashdeck.db"));
}

#[tokio::test]
async fn test_from_path_creates_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("flashdeck.db");

    let store = Store::from_path(&path).await.unwrap();
    assert!(path.exists());
    assert!(store.ping().await.is_ok());
}

#[tokio::test]
async fn test_deck_crud_with_stats() {
    let user = Uuid::new_v4();
    let (store, mut deck) = store_with_deck(user).await;

    add_card(&store, &deck, "What is a borrow?").await;
    let mut later = Card::new(user, deck.id, "What is a lifetime?", "a", CardOrigin::Manual);
    later.due_at = Utc::now() + Duration::days(1);
    store.create_card(&later).await.unwrap();

    let (loaded, stats) = store
        .get_deck_with_stats(user, deck.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(loaded, deck);
    assert_eq!(stats.cards_total, 2);
    assert_eq!(stats.due_count, 1);

    deck.name = "Rust 2024".to_string();
    deck.description = Some("edition changes".to_string());
    deck.updated_at = Utc::now();
    store.update_deck(&deck).await.unwrap();
    assert_eq!(store.get_deck(user, deck.id).await.unwrap(), deck);

    store.delete_deck(user, deck.id).await.unwrap();
    assert!(matches!(
        store.get_card(user, later.id).await,
        Err(Error::NotFound { entity: "card", .. })
    ));
    assert!(matches!(
        store.delete_deck(user, deck.id).await,
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_list_decks_paginates_newest_first() {
    let user = Uuid::new_v4();
    let store = Store::in_memory().await.unwrap();
    let base = Utc::now();

    for i in 0..3 {
        let mut deck = Deck::new(user, format!("deck {i}"), None);
        deck.created_at = base + Duration::seconds(i);
        store.create_deck(&deck).await.unwrap();
    }
    store.create_deck(&Deck::new(Uuid::new_v4(), "someone else", None)).await.unwrap();

    let (page, total) = store.list_decks(user, 2, 0, Utc::now()).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].0.name, "deck 2");
    assert_eq!(page[1].0.name, "deck 1");

    let (page, _) = store.list_decks(user, 2, 2, Utc::now()).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].0.name, "deck 0");
}

#[tokio::test]
async fn test_decks_are_scoped_to_owner() {
    let (store, deck) = store_with_deck(Uuid::new_v4()).await;
    let stranger = Uuid::new_v4();

    assert!(matches!(
        store.get_deck(stranger, deck.id).await,
        Err(Error::NotFound { entity: "deck", .. })
    ));
    assert!(store.delete_deck(stranger, deck.id).await.is_err());
}

#[tokio::test]
async fn test_duplicate_question_is_conflict() {
    let user = Uuid::new_v4();
    let (store, deck) = store_with_deck(user).await;

    add_card(&store, &deck, "What is Rust?").await;
    let duplicate = Card::new(user, deck.id, "what   is RUST?", "b", CardOrigin::Manual);

    assert!(matches!(
        store.create_card(&duplicate).await,
        Err(Error::Conflict(_))
    ));

    let (cards, total) = store.list_cards(user, deck.id, 20, 0).await.unwrap();
    assert_eq!(total, 1);
    assert!(cards.iter().any(|card| card.question == "What is Rust?"));
}

#[tokio::test]
async fn test_update_card_round_trips_review_state() {
    let user = Uuid::new_v4();
    let (store, deck) = store_with_deck(user).await;
    let mut card = add_card(&store, &deck, "Q").await;

    card.leitner_box = LeitnerBox::LAST;
    card.last_reviewed_at = Some(Utc::now());
    card.edit(None, Some("new answer".to_string()), Utc::now());
    store.update_card(&card).await.unwrap();

    let loaded = store.get_card(user, card.id).await.unwrap();
    assert_eq!(loaded, card);
    assert_eq!(loaded.leitner_box, LeitnerBox::FIRST);
}

#[tokio::test]
async fn test_review_updates_card_and_session_together() {
    let user = Uuid::new_v4();
    let (store, deck) = store_with_deck(user).await;
    let card = add_card(&store, &deck, "Q1").await;
    let schedule = LeitnerSchedule::default();

    let now = Utc::now();
    let (session, due) = store.start_session(user, deck.id, now).await.unwrap();
    assert_eq!(due, 1);

    let input = ReviewInput {
        card_id: card.id,
        result: ReviewResult::Know,
        response_ms: Some(1200),
    };
    let (review, updated) = store
        .apply_review(user, session.id, input, &schedule, now)
        .await
        .unwrap();

    assert_eq!(review.prev_box, LeitnerBox::FIRST);
    assert_eq!(review.new_box.get(), 2);
    assert_eq!(updated.due_at, now + Duration::days(3));
    assert_eq!(updated.last_reviewed_at, Some(now));
    assert_eq!(store.get_card(user, card.id).await.unwrap(), updated);

    let input = ReviewInput {
        result: ReviewResult::DontKnow,
        response_ms: None,
        ..input
    };
    let (review, updated) = store
        .apply_review(user, session.id, input, &schedule, now)
        .await
        .unwrap();
    assert_eq!(review.new_box, LeitnerBox::FIRST);
    assert_eq!(updated.due_at, now);

    let session = store.get_session(user, session.id).await.unwrap();
    assert_eq!(session.cards_reviewed, 2);
    assert_eq!(session.know_count, 1);
    assert_eq!(session.dont_know_count, 1);
    assert_eq!(store.session_reviews(user, session.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rejected_review_leaves_counters_untouched() {
    let user = Uuid::new_v4();
    let (store, deck) = store_with_deck(user).await;
    let other_deck = Deck::new(user, "Other", None);
    store.create_deck(&other_deck).await.unwrap();
    let foreign = add_card(&store, &other_deck, "Elsewhere").await;
    let schedule = LeitnerSchedule::default();

    let (session, _) = store.start_session(user, deck.id, Utc::now()).await.unwrap();
    let input = ReviewInput {
        card_id: foreign.id,
        result: ReviewResult::Know,
        response_ms: None,
    };

    let result = store
        .apply_review(user, session.id, input, &schedule, Utc::now())
        .await;
    assert!(matches!(result, Err(Error::NotFound { entity: "card", .. })));

    let session = store.get_session(user, session.id).await.unwrap();
    assert_eq!(session.cards_reviewed, 0);
    assert_eq!(store.get_card(user, foreign.id).await.unwrap(), foreign);
}

#[tokio::test]
async fn test_ended_session_rejects_reviews_and_second_end() {
    let user = Uuid::new_v4();
    let (store, deck) = store_with_deck(user).await;
    let card = add_card(&store, &deck, "Q").await;

    let (session, _) = store.start_session(user, deck.id, Utc::now()).await.unwrap();
    let ended = store.end_session(user, session.id, Utc::now()).await.unwrap();
    assert!(ended.is_ended());

    let input = ReviewInput {
        card_id: card.id,
        result: ReviewResult::Know,
        response_ms: None,
    };
    let result = store
        .apply_review(user, session.id, input, &LeitnerSchedule::default(), Utc::now())
        .await;
    assert!(matches!(result, Err(Error::Conflict(_))));
    assert_eq!(store.get_session(user, session.id).await.unwrap().cards_reviewed, 0);

    assert!(matches!(
        store.end_session(user, session.id, Utc::now()).await,
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        store.end_session(user, Uuid::new_v4(), Utc::now()).await,
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_due_cards_report_remaining() {
    let user = Uuid::new_v4();
    let (store, deck) = store_with_deck(user).await;
    for question in ["a", "b", "c"] {
        add_card(&store, &deck, question).await;
    }
    let mut not_due = Card::new(user, deck.id, "d", "d", CardOrigin::Manual);
    not_due.due_at = Utc::now() + Duration::days(7);
    store.create_card(&not_due).await.unwrap();

    let (session, due) = store.start_session(user, deck.id, Utc::now()).await.unwrap();
    assert_eq!(due, 3);

    let (cards, remaining) = store.due_cards(&session, 2, Utc::now()).await.unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(remaining, 1);
    assert!(cards[0].due_at <= cards[1].due_at);
    assert!(cards.iter().all(|card| card.id != not_due.id));
}

#[tokio::test]
async fn test_quota_counts_only_recent_successes() {
    let user = Uuid::new_v4();
    let store = Store::in_memory().await.unwrap();
    let tracker = QuotaTracker::new(store.clone(), QuotaPolicy::default());

    let check = tracker.check(user, Utc::now()).await.unwrap();
    assert!(check.allowed);
    assert_eq!(check.used, 0);
    assert_eq!(check.remaining, 15);

    tracker.record_failed_attempt(user, "ai_service_error").await;
    tracker.record_failed_attempt(user, "database_error").await;

    let mut stale = GenerationAttempt::succeeded(user, Uuid::new_v4());
    stale.created_at = Utc::now() - Duration::hours(25);
    store.record_attempt(&stale).await.unwrap();

    tracker
        .record_successful_attempt(user, Uuid::new_v4())
        .await
        .unwrap();
    tracker
        .record_successful_attempt(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();

    let check = tracker.check(user, Utc::now()).await.unwrap();
    assert_eq!(check.used, 1);
    assert_eq!(check.remaining, 14);

    let attempts = store.recent_attempts(user, 10).await.unwrap();
    assert_eq!(attempts.len(), 4);
    assert_eq!(
        attempts
            .iter()
            .filter(|a| a.status == GenerationStatus::Failed)
            .count(),
        2
    );
}

#[tokio::test]
async fn test_exhausted_quota_reports_retry_after() {
    let user = Uuid::new_v4();
    let store = Store::in_memory().await.unwrap();
    let tracker = QuotaTracker::new(store.clone(), QuotaPolicy::default());
    let now = Utc::now();

    for minutes in 0..15 {
        let mut attempt = GenerationAttempt::succeeded(user, Uuid::new_v4());
        attempt.created_at = now - Duration::minutes(60 - minutes);
        store.record_attempt(&attempt).await.unwrap();
    }

    let check = tracker.check(user, now).await.unwrap();
    assert!(!check.allowed);
    assert_eq!(check.remaining, 0);
    assert_eq!(check.retry_after_seconds, 23 * 3600);
}

#[tokio::test]
async fn test_persist_generation_refuses_beyond_limit() {
    let user = Uuid::new_v4();
    let store = Store::in_memory().await.unwrap();
    let policy = QuotaPolicy::new(2, 24).unwrap();

    let first = persist(&store, user, &policy, 2).await.unwrap();
    persist(&store, user, &policy, 1).await.unwrap();

    let generation = AiGeneration::succeeded(user, "one more", "mock", json!([]));
    let proposal = AiGeneratedCard::new(user, generation.id, "Q", "A");
    let result = store
        .persist_generation(&generation, &[proposal], &policy, Utc::now())
        .await;
    assert!(matches!(result, Err(Error::QuotaExceeded)));
    assert!(matches!(
        store.get_generation(user, generation.id).await,
        Err(Error::NotFound { .. })
    ));

    let tracker = QuotaTracker::new(store.clone(), policy);
    assert_eq!(tracker.check(user, Utc::now()).await.unwrap().used, 2);

    let cards = store.generated_cards(user, first.id).await.unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].question, "Q0");
    assert!(cards.iter().all(|card| !card.accepted));
    assert_eq!(
        store.get_generation(user, first.id).await.unwrap().raw_response,
        Some(json!({"cards": 2}))
    );
}

#[tokio::test]
async fn test_accept_generated_cards() {
    let user = Uuid::new_v4();
    let store = Store::in_memory().await.unwrap();
    let generation = persist(&store, user, &QuotaPolicy::default(), 3).await.unwrap();
    let proposals = store.generated_cards(user, generation.id).await.unwrap();

    let edited = store
        .edit_generated_card(user, proposals[0].id, Some("Edited?".to_string()), None)
        .await
        .unwrap();
    assert_eq!(edited.question, "Edited?");

    let deck = Deck::new(user, "From AI", None);
    let ids = [proposals[0].id, proposals[1].id];
    let accepted = store
        .accept_generated_cards(generation.id, &deck, &ids, Utc::now())
        .await
        .unwrap();
    assert_eq!(accepted, 2);

    let (cards, total) = store.list_cards(user, deck.id, 20, 0).await.unwrap();
    assert_eq!(total, 2);
    assert!(cards.iter().all(|card| card.origin == CardOrigin::Ai));
    assert!(cards.iter().any(|card| card.question == "Edited?"));

    let after = store.generated_cards(user, generation.id).await.unwrap();
    assert!(after[0].accepted && after[0].card_id.is_some());
    assert!(!after[2].accepted);

    assert!(matches!(
        store
            .edit_generated_card(user, proposals[0].id, None, Some("late".to_string()))
            .await,
        Err(Error::Conflict(_))
    ));
}

#[tokio::test]
async fn test_accept_rejects_foreign_ids_atomically() {
    let user = Uuid::new_v4();
    let store = Store::in_memory().await.unwrap();
    let generation = persist(&store, user, &QuotaPolicy::default(), 1).await.unwrap();
    let proposals = store.generated_cards(user, generation.id).await.unwrap();

    let deck = Deck::new(user, "Broken", None);
    let result = store
        .accept_generated_cards(
            generation.id,
            &deck,
            &[proposals[0].id, Uuid::new_v4()],
            Utc::now(),
        )
        .await;

    assert!(matches!(result, Err(Error::Domain(_))));
    assert!(store.get_deck(user, deck.id).await.is_err());
    assert!(!store.generated_cards(user, generation.id).await.unwrap()[0].accepted);
}

async fn persist_questions(store: &Store, user: Uuid, questions: &[&str]) -> AiGeneration {
    let generation = AiGeneration::succeeded(user, "rust", "mock", json!([]));
    let proposals: Vec<_> = questions
        .iter()
        .map(|q| AiGeneratedCard::new(user, generation.id, q, "answer"))
        .collect();
    store
        .persist_generation(&generation, &proposals, &QuotaPolicy::default(), Utc::now())
        .await
        .unwrap();
    generation
}

#[tokio::test]
async fn test_accept_skips_repeated_questions() {
    let user = Uuid::new_v4();
    let store = Store::in_memory().await.unwrap();
    let generation =
        persist_questions(&store, user, &["What is Rust?", " what  is RUST? ", "What is Cargo?"])
            .await;
    let proposals = store.generated_cards(user, generation.id).await.unwrap();
    let ids: Vec<Uuid> = proposals.iter().map(|card| card.id).collect();

    let deck = Deck::new(user, "Rust", None);
    let accepted = store
        .accept_generated_cards(generation.id, &deck, &ids, Utc::now())
        .await
        .unwrap();
    assert_eq!(accepted, 2);

    let (cards, total) = store.list_cards(user, deck.id, 20, 0).await.unwrap();
    assert_eq!(total, 2);
    assert!(cards.iter().any(|card| card.question == "What is Rust?"));

    let after = store.generated_cards(user, generation.id).await.unwrap();
    assert!(after[0].accepted);
    assert!(!after[1].accepted && after[1].card_id.is_none());
    assert!(after[2].accepted);
}

#[tokio::test]
async fn test_accept_enforces_card_text_limits() {
    let user = Uuid::new_v4();
    let store = Store::in_memory().await.unwrap();
    let long_question = "q".repeat(validation::QUESTION_MAX_CHARS + 1);
    let generation = persist_questions(&store, user, &["Fine?", &long_question]).await;
    let ids: Vec<Uuid> = store
        .generated_cards(user, generation.id)
        .await
        .unwrap()
        .iter()
        .map(|card| card.id)
        .collect();

    let deck = Deck::new(user, "Too long", None);
    let result = store
        .accept_generated_cards(generation.id, &deck, &ids, Utc::now())
        .await;

    assert!(matches!(result, Err(Error::Domain(_))));
    assert!(store.get_deck(user, deck.id).await.is_err());
}

#[tokio::test]
async fn test_failed_attempt_write_error_is_swallowed() {
    let user = Uuid::new_v4();
    let store = Store::in_memory().await.unwrap();
    let tracker = QuotaTracker::new(store.clone(), QuotaPolicy::default());

    sqlx::query("DROP TABLE ai_generation_attempts")
        .execute(store.pool())
        .await
        .unwrap();

    // Returns normally even though the row cannot be written
    tracker.record_failed_attempt(user, "ai_service_error").await;

    assert!(matches!(
        store.record_attempt(&GenerationAttempt::failed(user, "database_error")).await,
        Err(Error::Database(_))
    ));
    assert!(tracker.check(user, Utc::now()).await.is_err());
}

#[tokio::test]
async fn test_issue_reports() {
    let user = Uuid::new_v4();
    let (store, deck) = store_with_deck(user).await;
    let card = add_card(&store, &deck, "Q").await;

    let mut first = CardIssueReport::open(user, card.id, "Typo in answer");
    first.created_at = Utc::now() - Duration::minutes(1);
    store.create_issue(&first).await.unwrap();
    let second = CardIssueReport::open(user, card.id, "Outdated");
    store.create_issue(&second).await.unwrap();

    let issues = store.list_issues(user, card.id).await.unwrap();
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0], second);
    assert_eq!(issues[1].description, "Typo in answer");

    let orphan = CardIssueReport::open(user, Uuid::new_v4(), "nope");
    assert!(matches!(
        store.create_issue(&orphan).await,
        Err(Error::NotFound { entity: "card", .. })
    ));
}
