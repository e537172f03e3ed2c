//! CLI command: `flashdeck quota <user-id>`
//!
//! Displays the user's rolling AI generation quota and their latest attempts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flashdeck_core::{dto::QuotaDto, GenerationAttempt, QuotaCheck};
use flashdeck_store::{QuotaTracker, Store};
use uuid::Uuid;

use crate::server::config::AppConfig;

const RECENT_ATTEMPTS: i64 = 10;

/// Run the quota subcommand.
pub async fn run(config: &AppConfig, user_id: Uuid, json: bool) -> Result<()> {
    let store = crate::server::open_store(config).await?;
    let (check, attempts) = load(&store, config, user_id).await?;

    if json {
        let output = serde_json::json!({
            "userId": user_id,
            "quota": QuotaDto::from(&check),
            "allowed": check.allowed,
            "retryAfterSeconds": check.retry_after_seconds,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_table(user_id, &check, &attempts, Utc::now());
    }
    Ok(())
}

async fn load(
    store: &Store,
    config: &AppConfig,
    user_id: Uuid,
) -> Result<(QuotaCheck, Vec<GenerationAttempt>)> {
    let tracker = QuotaTracker::new(store.clone(), config.quota_policy()?);
    let check = tracker
        .check(user_id, Utc::now())
        .await
        .context("Failed to check quota")?;
    let attempts = store
        .recent_attempts(user_id, RECENT_ATTEMPTS)
        .await
        .context("Failed to load generation attempts")?;
    Ok((check, attempts))
}

/// Pretty-printed table output.
fn print_table(user_id: Uuid, check: &QuotaCheck, attempts: &[GenerationAttempt], now: DateTime<Utc>) {
    println!();
    println!("  AI Generation Quota ({user_id})");
    println!("  {}", "-".repeat(56));
    println!("  {:<20} {}/{}", "Used", check.used, check.limit);
    println!("  {:<20} {}", "Remaining", check.remaining);
    println!(
        "  {:<20} {} (in {})",
        "Resets at",
        check.reset_at.format("%Y-%m-%d %H:%M:%S UTC"),
        format_duration(check.retry_after_seconds)
    );
    if !check.allowed {
        println!("  !! Limit reached");
    }

    println!();
    println!("  Recent Attempts");
    println!("  {}", "-".repeat(56));
    if attempts.is_empty() {
        println!("  (no attempts recorded yet)");
    }
    for attempt in attempts {
        println!(
            "  {:<12} {:<20} {}",
            attempt.status.as_str(),
            attempt.error_code.as_deref().unwrap_or("-"),
            format_ago(now, attempt.created_at)
        );
    }
    println!();
}

/// Format seconds as "Xh Ym" or "Ym"
fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

fn format_ago(now: DateTime<Utc>, at: DateTime<Utc>) -> String {
    format!("{} ago", format_duration((now - at).num_seconds()))
}
