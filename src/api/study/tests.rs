use crate::api::test_support::{create_card, create_deck, get, mock_state, patch, post};
use axum::http::StatusCode;
use serde_json::json;

async fn start(state: &crate::server::AppState, deck_id: &str) -> String {
    let response = post(
        state,
        &format!("/api/decks/{deck_id}/study-sessions"),
        json!({}),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_study_flow() {
    let state = mock_state().await;
    let deck_id = create_deck(&state, "Capitals").await;
    let peru = create_card(&state, &deck_id, "Capital of Peru?").await;
    let chile = create_card(&state, &deck_id, "Capital of Chile?").await;

    let response = post(
        &state,
        &format!("/api/decks/{deck_id}/study-sessions"),
        json!({}),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["dueCardsCount"], 2);
    assert_eq!(response.body["deckId"], deck_id.as_str());
    let session_id = response.body["sessionId"].as_str().unwrap().to_string();

    let response = get(&state, &format!("/api/study-sessions/{session_id}/cards?limit=1")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["cards"].as_array().unwrap().len(), 1);
    assert_eq!(response.body["remaining"], 1);

    let reviews = format!("/api/study-sessions/{session_id}/reviews");
    let response = post(
        &state,
        &reviews,
        json!({ "cardId": peru, "result": "know", "responseDurationMs": 1200 }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["previousBox"], 1);
    assert_eq!(response.body["newBox"], 2);
    assert_eq!(response.body["result"], "know");

    let response = post(&state, &reviews, json!({ "cardId": chile, "result": "dont_know" })).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["newBox"], 1);
    assert_eq!(response.body["newDueAt"], response.body["reviewedAt"]);

    // Peru moved out of the due set, Chile is due again immediately
    let response = get(&state, &format!("/api/study-sessions/{session_id}/cards")).await;
    let due: Vec<&str> = response.body["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(due, vec![chile.as_str()]);
    assert_eq!(response.body["remaining"], 0);

    let response = patch(&state, &format!("/api/study-sessions/{session_id}/end"), json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["cardsReviewed"], 2);
    assert_eq!(response.body["knowCount"], 1);
    assert_eq!(response.body["dontKnowCount"], 1);
    assert!(response.body["endedAt"].is_string());
    assert!(response.body["durationSeconds"].as_i64().unwrap() >= 0);
}

#[tokio::test]
async fn test_ended_session_rejects_reviews() {
    let state = mock_state().await;
    let deck_id = create_deck(&state, "Closed").await;
    let card_id = create_card(&state, &deck_id, "Still here?").await;
    let session_id = start(&state, &deck_id).await;
    let end = format!("/api/study-sessions/{session_id}/end");

    assert_eq!(patch(&state, &end, json!({})).await.status, StatusCode::OK);

    let response = patch(&state, &end, json!({})).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "conflict");

    let response = post(
        &state,
        &format!("/api/study-sessions/{session_id}/reviews"),
        json!({ "cardId": card_id, "result": "know" }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_review_validation() {
    let state = mock_state().await;
    let deck_id = create_deck(&state, "Rules").await;
    let card_id = create_card(&state, &deck_id, "Rule one?").await;
    let session_id = start(&state, &deck_id).await;
    let reviews = format!("/api/study-sessions/{session_id}/reviews");

    let response = post(
        &state,
        &reviews,
        json!({ "cardId": card_id, "result": "know", "responseDurationMs": 3_600_001 }),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["fields"], json!(["responseDurationMs"]));

    let response = post(&state, &reviews, json!({ "cardId": card_id, "result": "maybe" })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "validation_error");

    // A card from another deck is not part of this session
    let other_deck = create_deck(&state, "Elsewhere").await;
    let stranger = create_card(&state, &other_deck, "Wrong deck?").await;
    let response = post(&state, &reviews, json!({ "cardId": stranger, "result": "know" })).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // Rejected reviews leave the counters untouched
    let response = patch(&state, &format!("/api/study-sessions/{session_id}/end"), json!({})).await;
    assert_eq!(response.body["cardsReviewed"], 0);
}

#[tokio::test]
async fn test_missing_session_and_deck() {
    let state = mock_state().await;
    let missing = uuid::Uuid::new_v4();

    let response = post(
        &state,
        &format!("/api/decks/{missing}/study-sessions"),
        json!({}),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = get(&state, &format!("/api/study-sessions/{missing}/cards")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
