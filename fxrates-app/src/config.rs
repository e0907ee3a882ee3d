//! Configuration loading from environment.

use std::env;

use fxrates_provider::DEFAULT_PROVIDER_URL;

/// Application configuration.
///
/// `database_url` is the workflow instance repository. The rate document
/// store is not configured here; each instance resolves its connection
/// string from the secret store at runtime.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub provider_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let provider_url =
            env::var("PROVIDER_URL").unwrap_or_else(|_| DEFAULT_PROVIDER_URL.to_string());

        Ok(Self {
            port,
            database_url,
            provider_url,
        })
    }
}
