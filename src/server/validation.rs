//! Production configuration validation
//!
//! Security checks for production deployments.

use super::config::AppConfig;
use flashdeck_ai::ProviderKind;
use tracing::warn;

/// Warn about settings that should not reach production
pub fn validate_production_config(config: &AppConfig) {
    let is_production = std::env::var("FLASHDECK_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false);

    if !is_production {
        return;
    }

    if config.server.host == "0.0.0.0" {
        warn!(
            "SECURITY WARNING: Server is binding to all interfaces (0.0.0.0) in production. \
             Consider binding to 127.0.0.1 and using a reverse proxy."
        );
    }

    if config.auth.allow_user_header {
        warn!(
            "SECURITY WARNING: X-User-Id overrides are enabled in production. \
             Any client can act as any user. Set [auth] allow_user_header = false."
        );
    }

    if config.ai.provider == ProviderKind::Mock {
        warn!("AI provider is 'mock' in production; generated cards are placeholders.");
    }
}
