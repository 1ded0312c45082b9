//! Configuration module.
//!
//! Handles loading and parsing of the YAML configuration file and
//! environment variables, and validates the result once at startup so a
//! missing signing secret fails the process before the first request.

use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authentication engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    /// Secret used to sign session tokens. Required, non-empty.
    pub signing_secret: String,
    /// Session token lifetime in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl_secs() -> u64 {
    3600
}

/// Application configuration settings
#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Authentication engine configuration
    pub auth: AuthSettings,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Missing required config value: {0}")]
    MissingConfig(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl Settings {
    /// Creates a new Settings instance by loading and merging configuration
    /// from multiple sources.
    ///
    /// # Configuration Sources
    /// Configuration is loaded in the following order (later sources override
    /// earlier ones):
    /// 1. Base configuration (`config/application.yml`, optional)
    /// 2. Environment variables (prefixed with `APP_`, `__` as separator,
    ///    e.g. `APP_AUTH__SIGNING_SECRET`)
    ///
    /// # Errors
    /// Returns a `ConfigError` if configuration cannot be read or parsed, or
    /// if `auth.signing_secret` is empty.
    pub fn new() -> Result<Self, ConfigError> {
        let builder = ConfigFile::builder()
            .add_source(File::with_name("config/application.yml").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));

        let config = builder.build()?;
        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.signing_secret.trim().is_empty() {
            return Err(ConfigError::MissingConfig("auth.signing_secret".to_string()));
        }
        Ok(())
    }
}
