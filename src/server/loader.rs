//! Configuration loading
//!
//! Layers, lowest priority first: the defaults compiled into the binary,
//! `default.toml`, `<env>.toml` and `local.toml` from the config directory,
//! then `FLASHDECK_<SECTION>__<KEY>` environment variables.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

const CONFIG_DIR: &str = "config";
const DEFAULT_ENV: &str = "development";

/// Load configuration from `./config`, `FLASHDECK_ENV` and the environment
pub fn load_config() -> Result<AppConfig> {
    let env_name = std::env::var("FLASHDECK_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
    let config = file_layers(Path::new(CONFIG_DIR), &env_name)
        .add_source(
            Environment::with_prefix("FLASHDECK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;
    finish(config)
}

fn file_layers(dir: &Path, env_name: &str) -> ConfigBuilder<DefaultState> {
    let file = |name: &str| File::from(dir.join(name)).required(false);
    Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(file("default.toml"))
        .add_source(file(&format!("{env_name}.toml")))
        .add_source(file("local.toml"))
}

fn finish(config: Config) -> Result<AppConfig> {
    let config: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
