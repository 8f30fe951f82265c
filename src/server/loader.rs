//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            File::with_name(&format!(
                "config/{}",
                std::env::var("PAGEPILOT_ENV").unwrap_or_else(|_| "production".to_string())
            ))
            .required(false),
        )
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority)
        // prefix_separator("_") makes PAGEPILOT_SERVER__PORT work.
        .add_source(
            Environment::with_prefix("PAGEPILOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    // Conventional deployment variables win over everything else.
    let builder = apply_conventional_env(builder)?;

    let config: AppConfig = builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    config.validate()?;
    Ok(config)
}

fn apply_conventional_env(
    mut builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port
            .parse()
            .with_context(|| format!("PORT is not a valid port: {}", port))?;
        builder = builder.set_override("server.port", i64::from(port))?;
    }
    if let Ok(origin) = std::env::var("FRONTEND_URL") {
        builder = builder.set_override("server.allowed_origin", origin)?;
    }
    if let Ok(environment) = std::env::var("PAGEPILOT_ENV") {
        builder = builder.set_override("server.environment", environment)?;
    }
    Ok(builder)
}
