// Configuration management

use crate::core::errors::IdentityError;
use secrecy::{ExposeSecret, Secret};
use std::env;
use std::fmt;

/// Minimum length of an HMAC signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Application configuration loaded from environment variables
///
/// Without `DATABASE_URL` the service runs on the in-memory store; without
/// `EMAIL_API_URL` verification emails are only logged.
pub struct Config {
    // Persistence
    pub database_url: Option<String>,

    // Token signing
    pub jwt_secret: Secret<String>,
    pub email_secret: Secret<String>,

    // Ledger network
    pub ledger_url: String,
    pub ledger_timeout_secs: u64,
    pub wallet_verification_timeout_secs: u64,

    // Email dispatch
    pub email_api_url: Option<String>,
    pub email_api_key: Option<Secret<String>>,
    pub email_sender: String,
    pub verification_base_url: String,
    pub email_timeout_secs: u64,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    pub fn from_env() -> Result<Self, IdentityError> {
        // Skip in test environment to avoid interfering with test environment variables
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok();
        }

        let config = Self {
            database_url: Self::get_optional_env("DATABASE_URL"),
            jwt_secret: Self::get_required_secret("JWT_SECRET")?,
            email_secret: Self::get_required_secret("EMAIL_SECRET")?,
            ledger_url: Self::get_env_or_default("LEDGER_URL", "https://horizon.stellar.org"),
            ledger_timeout_secs: Self::parse_u64_or_default("LEDGER_TIMEOUT_SECS", 5)?,
            wallet_verification_timeout_secs: Self::parse_u64_or_default(
                "WALLET_VERIFICATION_TIMEOUT_SECS",
                10,
            )?,
            email_api_url: Self::get_optional_env("EMAIL_API_URL"),
            email_api_key: Self::get_optional_env("EMAIL_API_KEY").map(Secret::new),
            email_sender: Self::get_env_or_default("EMAIL_SENDER", "no-reply@volunchain.org"),
            verification_base_url: Self::get_env_or_default(
                "VERIFICATION_BASE_URL",
                "http://localhost:3000/auth/verify-email",
            ),
            email_timeout_secs: Self::parse_u64_or_default("EMAIL_TIMEOUT_SECS", 5)?,
            log_level: Self::get_env_or_default("LOG_LEVEL", "info"),
            log_format: Self::get_env_or_default("LOG_FORMAT", "json"),
        };

        config.validate()?;

        Ok(config)
    }

    fn get_env_or_default(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    fn get_optional_env(key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => None,
        }
    }

    fn get_required_secret(key: &str) -> Result<Secret<String>, IdentityError> {
        let value = env::var(key)
            .map_err(|_| IdentityError::Configuration(format!("{} not set", key)))?;

        if value.is_empty() {
            return Err(IdentityError::Configuration(format!("{} is empty", key)));
        }

        Ok(Secret::new(value))
    }

    /// Parse u64 from environment variable or return default
    fn parse_u64_or_default(key: &str, default: u64) -> Result<u64, IdentityError> {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.parse::<u64>().map_err(|e| {
                    IdentityError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
                })?;

                if parsed == 0 {
                    return Err(IdentityError::Configuration(format!(
                        "{} must be greater than 0",
                        key
                    )));
                }

                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    /// Validate all configuration values
    fn validate(&self) -> Result<(), IdentityError> {
        Self::validate_secret(&self.jwt_secret, "JWT_SECRET")?;
        Self::validate_secret(&self.email_secret, "EMAIL_SECRET")?;

        if self.jwt_secret.expose_secret() == self.email_secret.expose_secret() {
            return Err(IdentityError::Configuration(
                "JWT_SECRET and EMAIL_SECRET must differ".to_string(),
            ));
        }

        Self::validate_url(&self.ledger_url, "Ledger")?;
        Self::validate_url(&self.verification_base_url, "Verification base")?;
        if let Some(ref url) = self.database_url {
            Self::validate_url(url, "Database")?;
        }
        if let Some(ref url) = self.email_api_url {
            Self::validate_url(url, "Email API")?;
            if self.email_api_key.is_none() {
                return Err(IdentityError::Configuration(
                    "EMAIL_API_KEY must be set when EMAIL_API_URL is set".to_string(),
                ));
            }
        }

        if !self.email_sender.contains('@') {
            return Err(IdentityError::Configuration(format!(
                "Invalid EMAIL_SENDER '{}'",
                self.email_sender
            )));
        }

        Self::validate_log_level(&self.log_level)?;
        Self::validate_log_format(&self.log_format)?;

        Ok(())
    }

    fn validate_secret(secret: &Secret<String>, key: &str) -> Result<(), IdentityError> {
        if secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(IdentityError::Configuration(format!(
                "{} must be at least {} bytes",
                key, MIN_SECRET_LEN
            )));
        }
        Ok(())
    }

    /// Validate URL format
    fn validate_url(url: &str, description: &str) -> Result<(), IdentityError> {
        url::Url::parse(url).map_err(|e| {
            IdentityError::Configuration(format!("Invalid {} URL '{}': {}", description, url, e))
        })?;
        Ok(())
    }

    fn validate_log_level(level: &str) -> Result<(), IdentityError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level.to_lowercase().as_str()) {
            return Err(IdentityError::Configuration(format!(
                "Invalid LOG_LEVEL '{}': must be one of {}",
                level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_log_format(format: &str) -> Result<(), IdentityError> {
        if format != "json" && format != "text" {
            return Err(IdentityError::Configuration(format!(
                "Invalid LOG_FORMAT '{}': must be 'json' or 'text'",
                format
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url.as_ref().map(|_| "<REDACTED>"))
            .field("jwt_secret", &"<REDACTED>")
            .field("email_secret", &"<REDACTED>")
            .field("ledger_url", &self.ledger_url)
            .field("ledger_timeout_secs", &self.ledger_timeout_secs)
            .field("wallet_verification_timeout_secs", &self.wallet_verification_timeout_secs)
            .field("email_api_url", &self.email_api_url)
            .field("email_api_key", &self.email_api_key.as_ref().map(|_| "<REDACTED>"))
            .field("email_sender", &self.email_sender)
            .field("verification_base_url", &self.verification_base_url)
            .field("email_timeout_secs", &self.email_timeout_secs)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Create a test configuration for unit tests
    ///
    /// Bypasses environment variable loading: in-memory store, log-only
    /// email dispatch, ledger on localhost.
    pub fn test_config() -> Self {
        Self {
            database_url: None,
            jwt_secret: Secret::new("test-session-secret-0123456789abcdef".to_string()),
            email_secret: Secret::new("test-email-secret-0123456789abcdef".to_string()),
            ledger_url: "http://127.0.0.1:8000".to_string(),
            ledger_timeout_secs: 5,
            wallet_verification_timeout_secs: 10,
            email_api_url: None,
            email_api_key: None,
            email_sender: "no-reply@volunchain.org".to_string(),
            verification_base_url: "http://localhost:3000/auth/verify-email".to_string(),
            email_timeout_secs: 5,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}
