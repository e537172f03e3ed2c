//! Server initialization
//!
//! Contains the main `run()` function that opens the store, wires the state
//! and serves the API until a shutdown signal arrives.

use super::config::AppConfig;
use super::state::AppState;
use super::validation::validate_production_config;
use anyhow::{Context, Result};
use flashdeck_ai::build_generator;
use flashdeck_store::{QuotaTracker, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::middleware::auth::AuthSettings;

/// Open (and migrate) the configured SQLite database
pub async fn open_store(config: &AppConfig) -> Result<Store> {
    let path = config.db_path();
    info!("Opening database at {}", path.display());
    Store::from_path(&path)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))
}

/// Build the shared request state
///
/// A provider without credentials leaves the generator unset; the service
/// still starts and generation requests report a configuration error.
pub fn build_state(config: &AppConfig, store: Store) -> Result<AppState> {
    let generator = match build_generator(&config.generator_settings()) {
        Ok(generator) => Some(generator),
        Err(flashdeck_ai::Error::NotConfigured(msg)) => {
            warn!("AI generation disabled: {}", msg);
            None
        }
        Err(e) => return Err(e).context("Failed to initialize AI generator"),
    };

    Ok(AppState {
        quota: QuotaTracker::new(store.clone(), config.quota_policy()?),
        store,
        generator,
        schedule: Arc::new(config.schedule()?),
        auth: AuthSettings {
            mock_user_id: config.auth.mock_user_id,
            allow_user_header: config.auth.allow_user_header,
        },
    })
}

/// Run the server
pub async fn run(config: AppConfig) -> Result<()> {
    validate_production_config(&config);

    let store = open_store(&config).await?;
    let state = build_state(&config, store)?;
    let app = crate::api::app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Flashdeck shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
