//! Study session endpoints
//!
//! A session walks the due cards of one deck. Each review moves the card
//! between Leitner boxes and updates the session counters in one transaction.

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use flashdeck_core::dto::{
    EndSessionResponseDto, GetDueCardsResponseDto, StartStudySessionResponseDto, StudyCardDto,
    StudySessionDto, SubmitReviewCommand, SubmitReviewResponseDto,
};
use flashdeck_core::validation;
use flashdeck_store::ReviewInput;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::middleware::auth::CurrentUser;
use crate::server::AppState;

#[cfg(test)]
mod tests;

#[derive(Debug, Default, Deserialize)]
struct DueCardsQuery {
    limit: Option<i64>,
}

/// Create study routes
pub fn study_routes() -> Router {
    Router::new()
        .route("/api/decks/:deck_id/study-sessions", post(start_session))
        .route("/api/study-sessions/:session_id/cards", get(get_due_cards))
        .route("/api/study-sessions/:session_id/reviews", post(submit_review))
        .route("/api/study-sessions/:session_id/end", patch(end_session))
}

async fn start_session(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(deck_id): ApiPath<Uuid>,
) -> ApiResult<(StatusCode, Json<StartStudySessionResponseDto>)> {
    let (session, due_cards_count) = state
        .store
        .start_session(user_id, deck_id, Utc::now())
        .await?;
    info!(session_id = %session.id, %deck_id, due_cards_count, "Study session started");

    Ok((
        StatusCode::CREATED,
        Json(StartStudySessionResponseDto {
            session_id: session.id,
            deck_id: session.deck_id,
            started_at: session.started_at,
            due_cards_count,
        }),
    ))
}

/// Next batch of due cards, oldest due first
async fn get_due_cards(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DueCardsQuery>,
) -> ApiResult<Json<GetDueCardsResponseDto>> {
    let (limit, _) = validation::page(query.limit, None);
    let session = state.store.get_session(user_id, session_id).await?;
    let (cards, remaining) = state.store.due_cards(&session, limit, Utc::now()).await?;

    Ok(Json(GetDueCardsResponseDto {
        cards: cards.iter().map(StudyCardDto::from).collect(),
        remaining,
    }))
}

async fn submit_review(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<SubmitReviewCommand>,
) -> ApiResult<(StatusCode, Json<SubmitReviewResponseDto>)> {
    let response_ms = validation::response_ms(command.response_duration_ms)?;
    let input = ReviewInput {
        card_id: command.card_id,
        result: command.result,
        response_ms,
    };

    let (review, card) = state
        .store
        .apply_review(user_id, session_id, input, &state.schedule, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitReviewResponseDto {
            review_id: review.id,
            card_id: review.card_id,
            result: review.result,
            previous_box: review.prev_box,
            new_box: review.new_box,
            new_due_at: card.due_at,
            reviewed_at: review.reviewed_at,
        }),
    ))
}

async fn end_session(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> ApiResult<Json<EndSessionResponseDto>> {
    let now = Utc::now();
    let session = state.store.end_session(user_id, session_id, now).await?;
    let duration_seconds = session.duration_seconds(now);
    info!(
        %session_id,
        cards_reviewed = session.cards_reviewed,
        duration_seconds,
        "Study session ended"
    );

    Ok(Json(EndSessionResponseDto {
        session: StudySessionDto::from(&session),
        duration_seconds,
    }))
}
