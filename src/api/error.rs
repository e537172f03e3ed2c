//! API error responses and rejection-aware extractors
//!
//! Every failure leaves the service as `{error, message, fields?, resetAt?}`
//! with the status that matches its [`ErrorCode`].

use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::{request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use flashdeck_core::{dto::ApiErrorDto, ErrorCode, QuotaCheck};
use serde::de::DeserializeOwned;
use tracing::error;

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: ErrorCode,
    message: String,
    fields: Option<Vec<String>>,
    reset_at: Option<DateTime<Utc>>,
    headers: HeaderMap,
}

impl ApiError {
    fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            fields: None,
            reset_at: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn validation(message: impl Into<String>, fields: Vec<String>) -> Self {
        let mut err = Self::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message);
        if !fields.is_empty() {
            err.fields = Some(fields);
        }
        err
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidJson, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ErrorCode::Conflict, message)
    }

    /// 429 carrying the reset time and rate-limit headers
    pub fn quota_exceeded(quota: &QuotaCheck) -> Self {
        let mut err = Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::QuotaExceeded,
            format!(
                "AI generation limit of {} per window reached. Try again later.",
                quota.limit
            ),
        );
        err.reset_at = Some(quota.reset_at);
        err.headers = rate_limit_headers(quota, true);
        err
    }

    pub fn ai_service(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::AiServiceError,
            message,
        )
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::DatabaseError,
            message,
        )
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ConfigurationError,
            message,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            message,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorDto {
            error: self.code.as_str().to_string(),
            message: self.message,
            fields: self.fields,
            reset_at: self.reset_at,
        };
        (self.status, self.headers, Json(body)).into_response()
    }
}

/// `X-RateLimit-*` headers for a quota state, plus `Retry-After` when refusing
pub fn rate_limit_headers(quota: &QuotaCheck, retry: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-limit", HeaderValue::from(quota.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(quota.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(quota.reset_timestamp));
    if retry {
        headers.insert(
            "retry-after",
            HeaderValue::from(quota.retry_after_seconds.max(0)),
        );
    }
    headers
}

// ============================================================================
// Conversions
// ============================================================================

impl From<flashdeck_core::Error> for ApiError {
    fn from(err: flashdeck_core::Error) -> Self {
        match err {
            flashdeck_core::Error::Validation { message, fields } => {
                Self::validation(message, fields)
            }
            flashdeck_core::Error::InvalidConfig(msg) => Self::configuration(msg),
            other => {
                error!(error = %other, "Corrupt stored value");
                Self::internal("Stored data could not be read")
            }
        }
    }
}

impl From<flashdeck_store::Error> for ApiError {
    fn from(err: flashdeck_store::Error) -> Self {
        use flashdeck_store::Error;

        match err {
            Error::NotFound { entity, .. } => Self::not_found(format!("{entity} not found")),
            Error::Conflict(msg) => Self::conflict(msg),
            Error::QuotaExceeded => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                ErrorCode::QuotaExceeded,
                "AI generation limit reached. Try again later.",
            ),
            Error::Domain(err) => err.into(),
            Error::Database(e) => {
                error!(error = %e, "Database error");
                Self::database("A database error occurred")
            }
            Error::Io(e) => {
                error!(error = %e, "Storage I/O error");
                Self::database("A database error occurred")
            }
            Error::Serialization(msg) => {
                error!(error = %msg, "Serialization error");
                Self::database("A database error occurred")
            }
        }
    }
}

impl From<flashdeck_ai::Error> for ApiError {
    fn from(err: flashdeck_ai::Error) -> Self {
        match err {
            flashdeck_ai::Error::NotConfigured(msg) => {
                Self::configuration(format!("AI generator is not configured: {msg}"))
            }
            other => {
                error!(error = %other, "AI generation failed");
                Self::ai_service("AI card generation failed. Please try again later.")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON with the wrong shape
            JsonRejection::JsonDataError(e) => Self::validation(e.body_text(), Vec::new()),
            other => Self::invalid_json(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text(), Vec::new())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text(), Vec::new())
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// `Json` whose rejections use the API error shape
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Path` whose rejections use the API error shape
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// `Query` whose rejections use the API error shape
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
