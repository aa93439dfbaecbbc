use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "SITEKEEPER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/sitekeeper.toml";
const ENV_PREFIX: &str = "SITEKEEPER";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;

    // Load secrets from environment variables
    load_secrets(&mut config);

    Ok(config)
}

/// Load secrets from environment variables into config
/// Secrets are never stored in TOML files, only in environment
fn load_secrets(config: &mut Config) {
    if let Ok(api_key) = env::var("SITEKEEPER_API_KEY") {
        config.site.api_key = Some(api_key);
    }

    // Alternative: the header-style name used by the remote plugin docs
    if config.site.api_key.is_none() {
        if let Ok(api_key) = env::var("WRM_API_KEY") {
            config.site.api_key = Some(api_key);
        }
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    // Start with defaults (handled by struct Default implementations)
    // Add TOML file if it exists (optional)
    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // Add environment variable overrides
    // SITEKEEPER__CLIENT__RATE_LIMIT_INTERVAL_MS -> client.rate_limit_interval_ms
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.client.rate_limit_interval_ms, 1000);
        assert!(config.site.base_url.is_none());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[site]
base_url = "https://client-site.example"

[client]
rate_limit_interval_ms = 1500
settle_delay_secs = 5
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(
            config.site.base_url.as_deref(),
            Some("https://client-site.example")
        );
        assert_eq!(config.client.rate_limit_interval_ms, 1500);
        assert_eq!(config.client.settle_delay_secs, 5);
        // Unset fields keep their defaults
        assert_eq!(config.client.verify_delay_secs, 5);
        assert_eq!(config.client.stall_threshold_secs, 240);
    }

    // Note: env-override tests are omitted due to unsafe env::set_var usage;
    // overrides go through the same config::Environment source as the file.

    #[test]
    fn test_api_key_not_loaded_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        // api_key in the file must be ignored; it is environment-only
        let toml_content = r#"
[site]
base_url = "https://client-site.example"
api_key = "should-not-load"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert!(config.site.api_key.is_none());
    }
}
