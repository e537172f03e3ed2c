//! Deck endpoints

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use flashdeck_core::dto::{
    CreateDeckCommand, DeckWithStatsDto, ListDecksResponseDto, PaginationDto, UpdateDeckCommand,
    UpdateDeckResponseDto,
};
use flashdeck_core::{validation, Deck, DeckStats};
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::api::PageQuery;
use crate::middleware::auth::CurrentUser;
use crate::server::AppState;


/// Create deck routes
pub fn decks_routes() -> Router {
    Router::new()
        .route("/api/decks", get(list_decks).post(create_deck))
        .route(
            "/api/decks/:deck_id",
            get(get_deck).patch(update_deck).delete(delete_deck),
        )
}

/// List decks, newest first
async fn list_decks(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<ListDecksResponseDto>> {
    let (limit, offset) = validation::page(query.limit, query.offset);
    let (decks, total) = state
        .store
        .list_decks(user_id, limit, offset, Utc::now())
        .await?;

    Ok(Json(ListDecksResponseDto {
        decks: decks
            .iter()
            .map(|(deck, stats)| DeckWithStatsDto::new(deck, stats))
            .collect(),
        pagination: PaginationDto {
            total,
            limit,
            offset,
        },
    }))
}

async fn create_deck(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiJson(command): ApiJson<CreateDeckCommand>,
) -> ApiResult<(StatusCode, Json<DeckWithStatsDto>)> {
    let name = validation::deck_name(&command.name)?;
    let description = validation::deck_description(command.description.as_deref())?;

    let deck = Deck::new(user_id, name, description);
    state.store.create_deck(&deck).await?;
    info!(deck_id = %deck.id, "Deck created");

    let stats = DeckStats {
        deck_id: deck.id,
        cards_total: 0,
        due_count: 0,
    };
    Ok((StatusCode::CREATED, Json(DeckWithStatsDto::new(&deck, &stats))))
}

async fn get_deck(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(deck_id): ApiPath<Uuid>,
) -> ApiResult<Json<DeckWithStatsDto>> {
    let (deck, stats) = state
        .store
        .get_deck_with_stats(user_id, deck_id, Utc::now())
        .await?;
    Ok(Json(DeckWithStatsDto::new(&deck, &stats)))
}

/// Rename a deck or change its description. An empty description clears it.
async fn update_deck(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(deck_id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<UpdateDeckCommand>,
) -> ApiResult<Json<UpdateDeckResponseDto>> {
    validation::at_least_one(&[
        ("name", command.name.is_some()),
        ("description", command.description.is_some()),
    ])?;
    let name = command.name.as_deref().map(validation::deck_name).transpose()?;
    let description = match command.description.as_deref() {
        Some(raw) => Some(validation::deck_description(Some(raw))?),
        None => None,
    };

    let mut deck = state.store.get_deck(user_id, deck_id).await?;
    if let Some(name) = name {
        deck.name = name;
    }
    if let Some(description) = description {
        deck.description = description;
    }
    deck.updated_at = Utc::now();

    state.store.update_deck(&deck).await?;
    Ok(Json(UpdateDeckResponseDto::from(&deck)))
}

/// Delete a deck with its cards, sessions and reviews
async fn delete_deck(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(deck_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_deck(user_id, deck_id).await?;
    info!(%deck_id, "Deck deleted");
    Ok(StatusCode::NO_CONTENT)
}
