//! Card endpoints

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use flashdeck_core::dto::{
    CardDto, CreateCardCommand, ListCardsResponseDto, PaginationDto, UpdateCardCommand,
    UpdateCardResponseDto,
};
use flashdeck_core::{validation, Card, CardOrigin};
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::api::PageQuery;
use crate::middleware::auth::CurrentUser;
use crate::server::AppState;

/// Create card routes
pub fn cards_routes() -> Router {
    Router::new()
        .route("/api/decks/:deck_id/cards", get(list_cards).post(create_card))
        .route("/api/cards/:card_id", patch(update_card).delete(delete_card))
}

/// List a deck's cards in creation order
async fn list_cards(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(deck_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<ListCardsResponseDto>> {
    let (limit, offset) = validation::page(query.limit, query.offset);
    state.store.get_deck(user_id, deck_id).await?;
    let (cards, total) = state
        .store
        .list_cards(user_id, deck_id, limit, offset)
        .await?;

    Ok(Json(ListCardsResponseDto {
        cards: cards.iter().map(CardDto::from).collect(),
        pagination: PaginationDto {
            total,
            limit,
            offset,
        },
    }))
}

/// Add a manual card, due immediately in box 1
async fn create_card(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(deck_id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<CreateCardCommand>,
) -> ApiResult<(StatusCode, Json<CardDto>)> {
    let question = validation::question(&command.question)?;
    let answer = validation::answer(&command.answer)?;

    state.store.get_deck(user_id, deck_id).await?;
    let card = Card::new(user_id, deck_id, question, answer, CardOrigin::Manual);
    state.store.create_card(&card).await?;
    info!(card_id = %card.id, %deck_id, "Card created");

    Ok((StatusCode::CREATED, Json(CardDto::from(&card))))
}

/// Edit a card's content. Learning progress starts over.
async fn update_card(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(card_id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<UpdateCardCommand>,
) -> ApiResult<Json<UpdateCardResponseDto>> {
    validation::at_least_one(&[
        ("question", command.question.is_some()),
        ("answer", command.answer.is_some()),
    ])?;
    let question = command.question.as_deref().map(validation::question).transpose()?;
    let answer = command.answer.as_deref().map(validation::answer).transpose()?;

    let mut card = state.store.get_card(user_id, card_id).await?;
    card.edit(question, answer, Utc::now());
    state.store.update_card(&card).await?;

    Ok(Json(UpdateCardResponseDto::from(&card)))
}

async fn delete_card(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(card_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_card(user_id, card_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{create_card, create_deck, delete, get, mock_state, patch, post};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_card() {
        let state = mock_state().await;
        let deck_id = create_deck(&state, "Chemistry").await;

        let response = post(
            &state,
            &format!("/api/decks/{deck_id}/cards"),
            json!({ "question": " What is H2O? ", "answer": "Water" }),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["question"], "What is H2O?");
        assert_eq!(response.body["origin"], "manual");
        assert_eq!(response.body["leitnerBox"], 1);
        assert!(response.body["lastReviewedAt"].is_null());
    }

    #[tokio::test]
    async fn test_create_card_validation() {
        let state = mock_state().await;
        let deck_id = create_deck(&state, "Chemistry").await;
        let uri = format!("/api/decks/{deck_id}/cards");

        let response = post(&state, &uri, json!({ "question": "", "answer": "x" })).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["fields"], json!(["question"]));

        let response = post(
            &state,
            &uri,
            json!({ "question": "Long?", "answer": "a".repeat(2_001) }),
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["fields"], json!(["answer"]));

        let missing = uuid::Uuid::new_v4();
        let response = post(
            &state,
            &format!("/api/decks/{missing}/cards"),
            json!({ "question": "Q", "answer": "A" }),
        )
        .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_question_conflicts() {
        let state = mock_state().await;
        let deck_id = create_deck(&state, "Chemistry").await;
        create_card(&state, &deck_id, "What is H2O?").await;

        let response = post(
            &state,
            &format!("/api/decks/{deck_id}/cards"),
            json!({ "question": "what  is h2o?", "answer": "Still water" }),
        )
        .await;
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.body["error"], "conflict");

        // Same question in another deck is fine
        let other_deck = create_deck(&state, "Physics").await;
        create_card(&state, &other_deck, "What is H2O?").await;
    }

    #[tokio::test]
    async fn test_list_cards_in_creation_order() {
        let state = mock_state().await;
        let deck_id = create_deck(&state, "Order").await;
        for question in ["One?", "Two?", "Three?"] {
            create_card(&state, &deck_id, question).await;
        }

        let response = get(&state, &format!("/api/decks/{deck_id}/cards?limit=2&offset=1")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["pagination"]["total"], 3);
        let questions: Vec<&str> = response.body["cards"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["question"].as_str().unwrap())
            .collect();
        assert_eq!(questions, vec!["Two?", "Three?"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_card() {
        let state = mock_state().await;
        let deck_id = create_deck(&state, "Edits").await;
        let card_id = create_card(&state, &deck_id, "Old?").await;
        let uri = format!("/api/cards/{card_id}");

        let response = patch(&state, &uri, json!({})).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let response = patch(&state, &uri, json!({ "question": "New?" })).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["question"], "New?");
        assert_eq!(response.body["answer"], "Answer to Old?");
        assert_eq!(response.body["leitnerBox"], 1);

        let response = delete(&state, &uri).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        let response = delete(&state, &uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
}
