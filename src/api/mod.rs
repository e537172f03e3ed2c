//! Web API module for Flashdeck
//!
//! Provides REST API endpoints for:
//! - AI card generation and the generation quota
//! - Decks and cards
//! - Study sessions and reviews
//! - Card issue reports
//! - Health checks

pub mod ai;
pub mod cards;
pub mod decks;
pub mod error;
pub mod health;
pub mod issues;
pub mod study;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{extract::Extension, Router};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use ai::ai_routes;
pub use cards::cards_routes;
pub use decks::decks_routes;
pub use health::health_routes;
pub use issues::issues_routes;
pub use study::study_routes;

use crate::server::AppState;

/// `?limit&offset` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create the application router with all endpoints and layers
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(ai_routes())
        .merge(decks_routes())
        .merge(cards_routes())
        .merge(study_routes())
        .merge(issues_routes())
        .merge(health_routes())
        .layer(Extension(state.auth))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
