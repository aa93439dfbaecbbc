//! Configuration management for SiteKeeper
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `SITEKEEPER__<section>__<key>`
//!
//! Examples:
//! - `SITEKEEPER__SITE__BASE_URL=https://client-site.example`
//! - `SITEKEEPER__CLIENT__RATE_LIMIT_INTERVAL_MS=1500`
//! - `SITEKEEPER__CLIENT__SETTLE_DELAY_SECS=10`
//!
//! The API key is a secret and is read only from `SITEKEEPER_API_KEY`
//! (or `WRM_API_KEY`), never from the TOML file.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/sitekeeper.toml`.
//! This can be overridden using the `SITEKEEPER_CONFIG` environment variable.

mod models;
mod sources;

// Re-export public types
pub use models::{ClientConfig, Config, SiteConfig};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a timing
    /// knob is set to a value the client cannot operate with.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if let Some(base_url) = &config.site.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "site.base_url must start with http:// or https://, got {base_url}"
            )));
        }
    }

    if config.client.request_timeout_secs == 0 || config.client.update_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "client timeouts must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[site]
base_url = "https://client-site.example"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(
            config.site.base_url.as_deref(),
            Some("https://client-site.example")
        );
        assert_eq!(config.client.rate_limit_interval_ms, 1000);
    }

    #[test]
    fn test_validation_rejects_bad_scheme() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[site]
base_url = "ftp://client-site.example"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[client]
request_timeout_secs = 0
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(result.is_err());
    }
}
