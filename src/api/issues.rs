//! Card issue report endpoints

use axum::{extract::Extension, http::StatusCode, routing::get, Json, Router};
use flashdeck_core::dto::{CardIssueReportDto, CreateCardIssueCommand, ListIssuesResponseDto};
use flashdeck_core::{validation, CardIssueReport};
use uuid::Uuid;

use crate::api::error::{ApiJson, ApiPath, ApiResult};
use crate::middleware::auth::CurrentUser;
use crate::server::AppState;

/// Create issue routes
pub fn issues_routes() -> Router {
    Router::new().route(
        "/api/cards/:card_id/issues",
        get(list_issues).post(create_issue),
    )
}

async fn create_issue(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(card_id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<CreateCardIssueCommand>,
) -> ApiResult<(StatusCode, Json<CardIssueReportDto>)> {
    let description = validation::issue_description(&command.description)?;
    let report = CardIssueReport::open(user_id, card_id, description);
    state.store.create_issue(&report).await?;
    Ok((StatusCode::CREATED, Json(CardIssueReportDto::from(&report))))
}

async fn list_issues(
    CurrentUser(user_id): CurrentUser,
    Extension(state): Extension<AppState>,
    ApiPath(card_id): ApiPath<Uuid>,
) -> ApiResult<Json<ListIssuesResponseDto>> {
    let issues = state.store.list_issues(user_id, card_id).await?;
    Ok(Json(ListIssuesResponseDto {
        issues: issues.iter().map(CardIssueReportDto::from).collect(),
    }))
}
