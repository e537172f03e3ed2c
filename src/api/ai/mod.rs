//! AI card generation endpoints
//!
//! - `POST /api/ai/generate`: quota-guarded generation
//! - `GET /api/ai/quota`: current quota state
//! - `GET /api/ai/generations/:generationId/cards`: proposals of a generation
//! - `PATCH /api/ai/generated-cards/:cardId`: edit a pending proposal
//! - `POST /api/ai/generations/:generationId/accept`: copy proposals into a new deck

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use flashdeck_core::dto::{
    AcceptGeneratedCardsCommand, AcceptGeneratedCardsResponseDto, AiGeneratedCardDto,
    DeckWithStatsDto, EditGeneratedCardCommand, EditGeneratedCardResponseDto,
    GenerateCardsCommand, GenerateCardsResponseDto, GetGeneratedCardsResponseDto, QuotaDto,
};
use flashdeck_core::models::normalize_question;
use flashdeck_core::{validation, AiGeneratedCard, AiGeneration, Deck, ErrorCode, QuotaCheck};
use std::collections::HashSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::error::{rate_limit_headers, ApiError, ApiJson, ApiPath, ApiResult};
use crate::middleware::auth::CurrentUser;
use crate::server::AppState;


/// Create AI routes
pub fn ai_routes() -> Router {
    Router::new()
        .route("/api/ai/generate", post(generate_cards))
        .route("/api/ai/quota", get(get_quota))
        .route(
            "/api/ai/generations/:generation_id/cards",
            get(get_generated_cards),
        )
        .route(
            "/api/ai/generations/:generation_id/accept",
            post(accept_generated_cards),
        )
        .route("/api/ai/generated-cards/:card_id", patch(edit_generated_card))
}

async fn current_quota(state: &AppState, user_id: Uuid) -> ApiResult<QuotaCheck> {
    state.quota.check(user_id, Utc::now()).await.map_err(|e| {
        error!(%user_id, error = %e, "Quota check failed");
        ApiError::internal("Failed to check quota")
    })
}

/// Generate flashcards from a prompt
async fn generate_cards(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiJson(command): ApiJson<GenerateCardsCommand>,
) -> ApiResult<(StatusCode, HeaderMap, Json<GenerateCardsResponseDto>)> {
    let prompt = validation::prompt(command.prompt.as_deref())?;

    let quota = current_quota(&state, user_id).await?;
    if !quota.allowed {
        info!(%user_id, used = quota.used, "Generation refused, quota exhausted");
        return Err(ApiError::quota_exceeded(&quota));
    }

    let Some(generator) = state.generator.clone() else {
        return Err(ApiError::configuration(
            "AI generator is not configured. Set FLASHDECK_AI__API_KEY or OPENAI_API_KEY.",
        ));
    };

    let batch = match generator.generate(&prompt).await {
        Ok(batch) => batch,
        Err(e) => {
            error!(%user_id, provider = generator.provider(), error = %e, "Card generation failed");
            state
                .quota
                .record_failed_attempt(user_id, ErrorCode::AiServiceError.as_str())
                .await;
            return Err(ApiError::ai_service(
                "AI card generation failed. Please try again later.",
            ));
        }
    };

    let generation = AiGeneration::succeeded(user_id, prompt, batch.model, batch.raw_response);
    let mut questions = HashSet::new();
    let cards: Vec<AiGeneratedCard> = batch
        .cards
        .iter()
        .filter(|draft| questions.insert(normalize_question(&draft.question)))
        .map(|draft| AiGeneratedCard::new(user_id, generation.id, &draft.question, &draft.answer))
        .collect();

    match state
        .store
        .persist_generation(&generation, &cards, state.quota.policy(), Utc::now())
        .await
    {
        Ok(_) => {}
        Err(flashdeck_store::Error::QuotaExceeded) => {
            // A concurrent request took the last slot
            let latest = current_quota(&state, user_id).await.unwrap_or(QuotaCheck {
                allowed: false,
                used: quota.limit,
                remaining: 0,
                ..quota
            });
            return Err(ApiError::quota_exceeded(&latest));
        }
        Err(e) => {
            error!(%user_id, error = %e, "Failed to persist generation");
            state
                .quota
                .record_failed_attempt(user_id, ErrorCode::DatabaseError.as_str())
                .await;
            return Err(ApiError::database("Failed to save generated cards"));
        }
    }

    info!(%user_id, generation_id = %generation.id, cards = cards.len(), "Cards generated");

    let headers = rate_limit_headers(&quota.after_success(), false);
    let body = GenerateCardsResponseDto {
        generation_id: generation.id,
        status: generation.status,
        cards: cards.iter().map(AiGeneratedCardDto::from).collect(),
        created_at: generation.created_at,
    };
    Ok((StatusCode::CREATED, headers, Json(body)))
}

/// Current generation quota
async fn get_quota(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
) -> ApiResult<(HeaderMap, Json<QuotaDto>)> {
    let quota = current_quota(&state, user_id).await?;
    Ok((rate_limit_headers(&quota, false), Json(QuotaDto::from(&quota))))
}

async fn get_generated_cards(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(generation_id): ApiPath<Uuid>,
) -> ApiResult<Json<GetGeneratedCardsResponseDto>> {
    let cards = state.store.generated_cards(user_id, generation_id).await?;
    Ok(Json(GetGeneratedCardsResponseDto {
        generation_id,
        cards: cards.iter().map(AiGeneratedCardDto::from).collect(),
    }))
}

async fn edit_generated_card(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(card_id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<EditGeneratedCardCommand>,
) -> ApiResult<Json<EditGeneratedCardResponseDto>> {
    validation::at_least_one(&[
        ("question", command.question.is_some()),
        ("answer", command.answer.is_some()),
    ])?;
    let question = command.question.as_deref().map(validation::question).transpose()?;
    let answer = command.answer.as_deref().map(validation::answer).transpose()?;

    let card = state
        .store
        .edit_generated_card(user_id, card_id, question, answer)
        .await?;
    Ok(Json(EditGeneratedCardResponseDto::from(&card)))
}

/// Report a validation failure under the accept command's field name
fn as_field(err: flashdeck_core::Error, field: &str) -> flashdeck_core::Error {
    match err {
        flashdeck_core::Error::Validation { message, .. } => flashdeck_core::Error::Validation {
            message,
            fields: vec![field.to_string()],
        },
        other => other,
    }
}

async fn accept_generated_cards(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(generation_id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<AcceptGeneratedCardsCommand>,
) -> ApiResult<(StatusCode, Json<AcceptGeneratedCardsResponseDto>)> {
    let name = validation::deck_name(&command.deck_name).map_err(|e| as_field(e, "deckName"))?;
    let description = validation::deck_description(command.deck_description.as_deref())
        .map_err(|e| as_field(e, "deckDescription"))?;
    if command.accepted_card_ids.is_empty() {
        return Err(flashdeck_core::Error::validation(
            "acceptedCardIds",
            "At least one card must be accepted",
        )
        .into());
    }

    let now = Utc::now();
    let deck = Deck::new(user_id, name, description);
    let accepted_count = state
        .store
        .accept_generated_cards(generation_id, &deck, &command.accepted_card_ids, now)
        .await?;
    if accepted_count == 0 {
        warn!(%generation_id, "Accept created a deck without new cards");
    }

    let (deck, stats) = state.store.get_deck_with_stats(user_id, deck.id, now).await?;
    Ok((
        StatusCode::CREATED,
        Json(AcceptGeneratedCardsResponseDto {
            deck: DeckWithStatsDto::new(&deck, &stats),
            accepted_count,
        }),
    ))
}
