//! Flashdeck - flashcard study backend
//!
//! CLI entry point for the Flashdeck server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod cli;
mod middleware;
mod server;

/// Set to `json` for structured log lines
const LOG_FORMAT_ENV: &str = "FLASHDECK_LOG_FORMAT";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let json_logs = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flashdeck=info,tower_http=info".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    cli::run(cli::Cli::parse()).await
}
