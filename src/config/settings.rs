//! Application settings loaded from environment variables.

use std::env;

use chrono::Duration;
use thiserror::Error;

use super::constants::{
    DEFAULT_ACCESS_TOKEN_EXPIRATION, DEFAULT_DATABASE_URL, DEFAULT_REFRESH_TOKEN_EXPIRATION,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, ENV_DEVELOPMENT, ENV_PRODUCTION,
    MAX_TOKEN_LIFETIME_DAYS, MIN_JWT_SECRET_LENGTH,
};

/// Configuration loading errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set in production")]
    Missing(&'static str),

    #[error("{0} must be at least {min} characters long", min = MIN_JWT_SECRET_LENGTH)]
    SecretTooShort(&'static str),

    #[error("JWT_SECRET and JWT_REFRESH_SECRET must be different")]
    SharedSecret,

    #[error("{key} has an invalid duration: {value:?}")]
    InvalidDuration { key: &'static str, value: String },
}

/// Deployment environment, drives the refresh cookie `Secure` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl From<&str> for Environment {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case(ENV_PRODUCTION) {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

/// Token signing configuration handed to the token service.
///
/// Access and refresh tokens are signed with two different secrets so that
/// one leaked secret cannot mint the other kind of token.
#[derive(Clone)]
pub struct AuthConfig {
    access_secret: String,
    refresh_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

impl AuthConfig {
    /// Build an auth config, enforcing secret length and distinctness.
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        access_token_ttl: Duration,
        refresh_token_ttl: Duration,
    ) -> Result<Self, ConfigError> {
        let access_secret = access_secret.into();
        let refresh_secret = refresh_secret.into();

        if access_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort("JWT_SECRET"));
        }
        if refresh_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort("JWT_REFRESH_SECRET"));
        }
        if access_secret == refresh_secret {
            return Err(ConfigError::SharedSecret);
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            access_token_ttl,
            refresh_token_ttl,
        })
    }

    /// Secret bytes for access token signing/verification.
    pub fn access_secret_bytes(&self) -> &[u8] {
        self.access_secret.as_bytes()
    }

    /// Secret bytes for refresh token signing/verification.
    pub fn refresh_secret_bytes(&self) -> &[u8] {
        self.refresh_secret.as_bytes()
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub environment: Environment,
    pub auth: AuthConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("environment", &self.environment)
            .field("auth", &self.auth)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// In debug builds missing secrets fall back to insecure development
    /// values; release builds refuse to start without them.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_secret = secret_or_dev_default(
            &get,
            "JWT_SECRET",
            "dev-access-secret-minimum-32-chars!!",
        )?;
        let refresh_secret = secret_or_dev_default(
            &get,
            "JWT_REFRESH_SECRET",
            "dev-refresh-secret-minimum-32-chars!",
        )?;

        let access_token_ttl =
            duration_var(&get, "JWT_EXPIRATION", DEFAULT_ACCESS_TOKEN_EXPIRATION)?;
        let refresh_token_ttl = duration_var(
            &get,
            "JWT_REFRESH_EXPIRATION",
            DEFAULT_REFRESH_TOKEN_EXPIRATION,
        )?;

        let auth = AuthConfig::new(
            access_secret,
            refresh_secret,
            access_token_ttl,
            refresh_token_ttl,
        )?;

        let environment = Environment::from(
            get("APP_ENV")
                .unwrap_or_else(|| ENV_DEVELOPMENT.to_string())
                .as_str(),
        );

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            server_host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            server_port: get("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            environment,
            auth,
        })
    }

    /// Whether the refresh cookie must carry the `Secure` flag.
    pub fn secure_cookies(&self) -> bool {
        self.environment.is_production()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn secret_or_dev_default<F>(
    get: &F,
    key: &'static str,
    dev_default: &str,
) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(secret) => Ok(secret),
        None if cfg!(debug_assertions) => {
            tracing::warn!("{} not set, using insecure default for development", key);
            Ok(dev_default.to_string())
        }
        None => Err(ConfigError::Missing(key)),
    }
}

fn duration_var<F>(get: &F, key: &'static str, default: &str) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = get(key).unwrap_or_else(|| default.to_string());
    parse_duration(&value)
        .filter(|ttl| *ttl <= Duration::days(MAX_TOKEN_LIFETIME_DAYS))
        .ok_or(ConfigError::InvalidDuration { key, value })
}

/// Parse a positive duration such as `3600`, `90s`, `15m`, `1h`, `7d` or `500ms`.
///
/// A bare number is read as seconds.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);

    let amount: i64 = digits.parse().ok()?;
    if amount == 0 {
        return None;
    }

    match unit.trim() {
        "" | "s" => Duration::try_seconds(amount),
        "ms" => Duration::try_milliseconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    }
}
