//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SPREE_API_ENDPOINT` - Base URL of the Spree backend (e.g. `https://api.example.com/`)
//! - `PAYUBIZ_KEY` - `PayU` merchant key
//! - `PAYUBIZ_SALT` - `PayU` merchant salt used to sign payment requests
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_APP_NAME` - Store name used in payment product info (default: Storefront)
//! - `SPREE_REQUEST_TIMEOUT_SECS` - Per-request timeout for Spree calls (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_SALT_LENGTH: usize = 8;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 2.5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Spree API configuration
    pub spree: SpreeConfig,
    /// `PayU` payment gateway configuration
    pub payubiz: PayuBizConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Spree backend configuration.
#[derive(Debug, Clone)]
pub struct SpreeConfig {
    /// Base URL of the Spree backend, always ending in `/`.
    pub api_endpoint: Url,
    /// Timeout applied to every Spree request.
    pub request_timeout: Duration,
}

impl SpreeConfig {
    /// Build a config for `endpoint`, normalising the trailing slash.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `endpoint` is not an absolute URL.
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, ConfigError> {
        let normalized = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let api_endpoint = Url::parse(&normalized).map_err(|e| {
            ConfigError::InvalidEnvVar("SPREE_API_ENDPOINT".to_string(), e.to_string())
        })?;
        Ok(Self {
            api_endpoint,
            request_timeout,
        })
    }
}

/// `PayU` (`PayUbiz`) merchant configuration.
///
/// Implements `Debug` manually to redact the salt.
#[derive(Clone)]
pub struct PayuBizConfig {
    /// Merchant key (sent in clear with every request)
    pub key: String,
    /// Merchant salt (signs the request, never sent)
    pub salt: SecretString,
    /// Store name, used as `{app_name}-Product` in the product info field
    pub app_name: String,
}

impl std::fmt::Debug for PayuBizConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayuBizConfig")
            .field("key", &self.key)
            .field("salt", &"[REDACTED]")
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the payment salt fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;

        let spree = SpreeConfig::from_env()?;
        let payubiz = PayuBizConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            spree,
            payubiz,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SpreeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = get_env_or_default(
            "SPREE_REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("SPREE_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Self::new(
            &get_required_env("SPREE_API_ENDPOINT")?,
            Duration::from_secs(timeout_secs),
        )
    }
}

impl PayuBizConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            key: get_required_env("PAYUBIZ_KEY")?,
            salt: get_validated_secret("PAYUBIZ_SALT")?,
            app_name: get_env_or_default("STOREFRONT_APP_NAME", "Storefront"),
        })
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
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is long enough, not a placeholder, and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.chars().count() < MIN_SALT_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_SALT_LENGTH} characters"),
        ));
    }

    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_salt_placeholder() {
        let result = validate_secret_strength("changeme-salt", "PAYUBIZ_SALT");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_salt_too_short() {
        let result = validate_secret_strength("a1B2", "PAYUBIZ_SALT");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_salt_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaa", "PAYUBIZ_SALT");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_salt_valid() {
        // Shape of a real PayU test salt
        assert!(validate_secret_strength("eCwWELxi", "PAYUBIZ_SALT").is_ok());
    }

    #[test]
    fn test_spree_config_normalises_trailing_slash() {
        let config = SpreeConfig::new("https://api.example.com", Duration::from_secs(5)).unwrap();
        assert_eq!(config.api_endpoint.as_str(), "https://api.example.com/");

        let joined = config.api_endpoint.join("api/v1/orders").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/api/v1/orders");
    }

    #[test]
    fn test_spree_config_rejects_relative_url() {
        assert!(SpreeConfig::new("not a url", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            spree: SpreeConfig::new("http://localhost:4000/", Duration::from_secs(30)).unwrap(),
            payubiz: PayuBizConfig {
                key: "gtKFFx".to_string(),
                salt: SecretString::from("eCwWELxi".to_string()),
                app_name: "Storefront".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_payubiz_config_debug_redacts_salt() {
        let config = PayuBizConfig {
            key: "merchant_key_value".to_string(),
            salt: SecretString::from("super_salty_value".to_string()),
            app_name: "Storefront".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("merchant_key_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_salty_value"));
    }
}
