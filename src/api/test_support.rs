//! Shared fixtures for HTTP handler tests

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use flashdeck_ai::{CardGenerator, GeneratedBatch, MockGenerator};
use flashdeck_core::{LeitnerSchedule, QuotaPolicy};
use flashdeck_store::{QuotaTracker, Store};
use mockall::mock;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use crate::middleware::auth::{AuthSettings, USER_ID_HEADER};
use crate::server::AppState;

pub const TEST_USER: Uuid = Uuid::from_u128(1);

mock! {
    pub Provider {}

    #[async_trait]
    impl CardGenerator for Provider {
        fn provider(&self) -> &'static str;
        async fn generate(&self, prompt: &str) -> flashdeck_ai::Result<GeneratedBatch>;
    }
}

/// State over a fresh in-memory store with the given generator
pub async fn state_with(generator: Option<Arc<dyn CardGenerator>>) -> AppState {
    let store = Store::in_memory().await.unwrap();
    AppState {
        quota: QuotaTracker::new(store.clone(), QuotaPolicy::default()),
        store,
        generator,
        schedule: Arc::new(LeitnerSchedule::default()),
        auth: AuthSettings {
            mock_user_id: TEST_USER,
            allow_user_header: true,
        },
    }
}

/// State backed by the offline mock generator
pub async fn mock_state() -> AppState {
    state_with(Some(Arc::new(MockGenerator::new(20)))).await
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Send one request through the full router
pub async fn send(
    state: &AppState,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let app: Router = crate::api::app(state.clone());
    let response = app.oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(state: &AppState, uri: &str) -> TestResponse {
    send(state, Method::GET, uri, None, None).await
}

pub async fn post(state: &AppState, uri: &str, body: Value) -> TestResponse {
    send(state, Method::POST, uri, None, Some(&body.to_string())).await
}

pub async fn patch(state: &AppState, uri: &str, body: Value) -> TestResponse {
    send(state, Method::PATCH, uri, None, Some(&body.to_string())).await
}

pub async fn delete(state: &AppState, uri: &str) -> TestResponse {
    send(state, Method::DELETE, uri, None, None).await
}

/// Create a deck and return its id
pub async fn create_deck(state: &AppState, name: &str) -> String {
    let response = post(state, "/api/decks", serde_json::json!({ "name": name })).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["id"].as_str().unwrap().to_string()
}

/// Create a card in a deck and return its id
pub async fn create_card(state: &AppState, deck_id: &str, question: &str) -> String {
    let response = post(
        state,
        &format!("/api/decks/{deck_id}/cards"),
        serde_json::json!({ "question": question, "answer": format!("Answer to {question}") }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["id"].as_str().unwrap().to_string()
}
