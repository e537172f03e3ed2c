//! Shared request state

use flashdeck_ai::CardGenerator;
use flashdeck_core::LeitnerSchedule;
use flashdeck_store::{QuotaTracker, Store};
use std::sync::Arc;

use crate::middleware::auth::AuthSettings;

/// Everything a handler needs, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub quota: QuotaTracker,
    /// `None` when the selected provider is missing credentials
    pub generator: Option<Arc<dyn CardGenerator>>,
    pub schedule: Arc<LeitnerSchedule>,
    pub auth: AuthSettings,
}
