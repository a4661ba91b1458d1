//! Shop API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOP_API_BASE_URL` - Base URL of the shop REST API
//!
//! ## Optional
//! - `SHOP_API_TOKEN` - Bearer token attached to every request
//! - `SHOP_API_TIMEOUT_SECS` - Request timeout in seconds (default: 30)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shop API configuration.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct ShopConfig {
    /// Base URL of the shop REST API.
    pub base_url: Url,
    /// Bearer token attached to every request, if the session has one.
    pub api_token: Option<SecretString>,
    /// Request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for ShopConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ShopConfig {
    /// Create a configuration pointing at the given base URL, with defaults
    /// for everything else.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `SHOP_API_BASE_URL` is missing or not a valid URL,
    /// or if `SHOP_API_TIMEOUT_SECS` is set but not an integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = require_env("SHOP_API_BASE_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("SHOP_API_BASE_URL".to_owned(), e.to_string())
        })?;

        let api_token = std::env::var("SHOP_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let timeout_secs = match std::env::var("SHOP_API_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("SHOP_API_TIMEOUT_SECS".to_owned(), e.to_string())
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            api_token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Read a required environment variable.
fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let config = ShopConfig::new(Url::parse("https://shop.example.com/api/").unwrap());
        assert!(config.api_token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = ShopConfig::new(Url::parse("https://shop.example.com/api/").unwrap());
        config.api_token = Some(SecretString::from("super-secret"));
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }
}
