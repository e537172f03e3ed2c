//! Mock authentication for Axum
//!
//! Every request acts as the configured user. When enabled, an `X-User-Id`
//! header overrides it so tests and local tools can act as several users.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::api::error::ApiError;

/// Header carrying a user id override
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authentication settings, installed as a request extension
#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    pub mock_user_id: Uuid,
    pub allow_user_header: bool,
}

// ============================================================================
// CurrentUser Extractor
// ============================================================================

/// Axum extractor yielding the id of the acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let settings = parts
            .extensions
            .get::<AuthSettings>()
            .copied()
            .ok_or_else(|| ApiError::internal("Authentication is not configured"))?;

        if !settings.allow_user_header {
            return Ok(CurrentUser(settings.mock_user_id));
        }

        match parts.headers.get(USER_ID_HEADER) {
            None => Ok(CurrentUser(settings.mock_user_id)),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
                .map(CurrentUser)
                .ok_or_else(|| ApiError::unauthorized("X-User-Id must be a valid UUID")),
        }
    }
}
