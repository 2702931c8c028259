//! Application configuration
//!
//! Split into focused sub-modules by domain:
//! - `server`: HTTP server settings
//! - `database`: SQLite database settings
//! - `engine`: scheduling engine timing and mode selection
//! - `delivery`: notification provider, delayed-callback queue, webhooks

mod database;
mod delivery;
mod engine;
mod server;

use serde::{Deserialize, Serialize};

pub use database::DatabaseConfig;
pub use delivery::{NotifierConfig, QueueConfig, WebhookConfig};
pub use engine::EngineAppConfig;
pub use server::ServerConfig;

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Scheduling engine configuration
    #[serde(default)]
    pub engine: EngineAppConfig,

    /// Notification provider configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Delayed-callback queue configuration (event mode)
    #[serde(default)]
    pub queue: QueueConfig,

    /// Webhook configuration (event mode)
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl AppConfig {
    /// Load configuration from an optional `config.toml` and `REMINDD_*`
    /// environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Load from file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (e.g., REMINDD_SERVER_PORT)
            .add_source(
                config::Environment::with_prefix("REMINDD")
                    .separator("_")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
