use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    /// Joins a relative endpoint path onto the configured base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub dir: String,
}

/// Policy for background token renewal. Automatic renewal is off by default;
/// whether it should ever default on is an open product question.
#[derive(Debug, Deserialize, Clone)]
pub struct RenewalConfig {
    pub auto_enabled: bool,
    pub interval_hours: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub renewal: RenewalConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default values
            .set_default("environment", "development")?
            .set_default("api.base_url", "http://localhost:3000/api")?
            .set_default("storage.dir", ".bmpresence")?
            .set_default("renewal.auto_enabled", false)?
            // Renew every 25 days, before the 30-day token expiry
            .set_default("renewal.interval_hours", 25 * 24)?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_API__BASE_URL=https://host/api` would set `Settings.api.base_url`
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    pub fn new_for_test() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("environment", "test")?
            .set_default("api.base_url", "http://localhost:3000/api")?
            .set_default("storage.dir", ".bmpresence-test")?
            .set_default("renewal.auto_enabled", false)?
            .set_default("renewal.interval_hours", 1)?
            .build()?
            .try_deserialize()
    }
}
