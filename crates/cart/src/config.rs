//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ROCKETSHOES_API_URL` - Base URL of the catalog serving `products/{id}` and `stock/{id}`
//!
//! ## Optional
//! - `ROCKETSHOES_STORAGE_DIR` - Directory holding the persisted cart (default: .rocketshoes)
//! - `ROCKETSHOES_STORAGE_KEY` - Storage slot key (default: @RocketShoes:cart)
//! - `ROCKETSHOES_API_TIMEOUT_SECS` - Catalog call time limit (default: 30)
//! - `ROCKETSHOES_PRODUCT_CACHE_TTL_SECS` - Product details cache TTL (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default storage slot key for the serialized cart.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

const DEFAULT_STORAGE_DIR: &str = ".rocketshoes";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Default time limit for a single catalog call.
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Catalog API configuration
    pub catalog: CatalogConfig,
    /// Directory where `FileStorage` keeps its slots
    pub storage_dir: PathBuf,
    /// Key of the slot holding the serialized cart
    pub storage_key: String,
}

/// Remote catalog configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL, always ending with `/` so relative joins keep the path
    pub base_url: Url,
    /// Time limit for a single product or stock call
    pub timeout: Duration,
    /// How long fetched product details stay cached
    pub product_cache_ttl: Duration,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let catalog = CatalogConfig::from_env()?;
        let storage_dir = PathBuf::from(get_env_or_default(
            "ROCKETSHOES_STORAGE_DIR",
            DEFAULT_STORAGE_DIR,
        ));
        let storage_key = get_env_or_default("ROCKETSHOES_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            catalog,
            storage_dir,
            storage_key,
        })
    }
}

impl CatalogConfig {
    /// Build a catalog configuration with default timeout and cache TTL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("ROCKETSHOES_API_URL", base_url)?,
            timeout: DEFAULT_CATALOG_TIMEOUT,
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
        })
    }

    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("ROCKETSHOES_API_URL")?;
        let mut config = Self::new(&base_url)?;

        if let Some(value) = get_optional_env("ROCKETSHOES_API_TIMEOUT_SECS") {
            config.timeout = parse_secs("ROCKETSHOES_API_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = get_optional_env("ROCKETSHOES_PRODUCT_CACHE_TTL_SECS") {
            config.product_cache_ttl = parse_secs("ROCKETSHOES_PRODUCT_CACHE_TTL_SECS", &value)?;
        }

        Ok(config)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a whole number of seconds.
fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the catalog base URL, normalizing it to end with a slash.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("TEST_VAR", "http://localhost:3333/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/api/");
        assert_eq!(
            url.join("products/1").unwrap().as_str(),
            "http://localhost:3333/api/products/1"
        );
    }

    #[test]
    fn test_parse_base_url_keeps_existing_slash() {
        let url = parse_base_url("TEST_VAR", "http://localhost:3333/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/");
    }

    #[test]
    fn test_parse_base_url_rejects_relative() {
        let result = parse_base_url("TEST_VAR", "localhost:3333");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("TEST_VAR", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("TEST_VAR", " 15 ").unwrap(), Duration::from_secs(15));
        assert!(parse_secs("TEST_VAR", "-1").is_err());
        assert!(parse_secs("TEST_VAR", "soon").is_err());
    }

    #[test]
    fn test_catalog_config_defaults() {
        let config = CatalogConfig::new("https://api.example.com").unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.example.com/");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.product_cache_ttl, Duration::from_secs(300));
    }
}
