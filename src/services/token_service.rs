//! Token service - JWT issuance and verification.
//!
//! Access tokens and refresh tokens are signed with different secrets; a
//! token of one kind never verifies as the other. Nothing is persisted:
//! verification is signature plus expiry only.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::AppError;

/// Access token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Refresh token payload. Carries the subject only; the email is always
/// re-read from the store when a refresh happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Token verification / signing failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token could not be parsed at all
    #[error("Malformed token")]
    Malformed,

    /// Bad signature, expired, or otherwise rejected by validation
    #[error("Invalid token")]
    Invalid,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::Invalid,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed | TokenError::Invalid => AppError::InvalidToken,
            TokenError::Signing(msg) => AppError::internal(msg),
        }
    }
}

/// Issues and verifies access/refresh tokens.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret_bytes()),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
            validation,
        }
    }

    /// Sign `{sub, email}` with the access secret.
    pub fn issue_access_token(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at(now, self.access_ttl)?,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Sign `{sub}` with the refresh secret.
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at(now, self.refresh_ttl)?,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let data = decode::<AccessClaims>(token, &self.access_decoding, &self.validation)?;
        Ok(data.claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let data = decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation)?;
        Ok(data.claims)
    }
}

/// Expiry timestamp, failing instead of overflowing on absurd lifetimes.
fn expires_at(now: DateTime<Utc>, ttl: Duration) -> Result<i64, TokenError> {
    now.checked_add_signed(ttl)
        .map(|exp| exp.timestamp())
        .ok_or_else(|| TokenError::Signing(format!("token lifetime {} out of range", ttl)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS: &str = "access-secret-for-tests-0123456789abcdef";
    const REFRESH: &str = "refresh-secret-for-tests-0123456789abcdef";

    fn service_with(access_ttl: Duration, refresh_ttl: Duration) -> TokenService {
        let config = AuthConfig::new(ACCESS, REFRESH, access_ttl, refresh_ttl).unwrap();
        TokenService::new(&config)
    }

    fn service() -> TokenService {
        service_with(Duration::hours(1), Duration::days(7))
    }

    #[test]
    fn test_access_token_round_trip() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let token = tokens.issue_access_token(user_id, "a@b.com").unwrap();
        let claims = tokens.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_refresh_token_has_own_expiry() {
        let tokens = service_with(Duration::minutes(15), Duration::days(30));
        let user_id = Uuid::new_v4();

        let claims = tokens
            .verify_refresh_token(&tokens.issue_refresh_token(user_id).unwrap())
            .unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
    }

    #[test]
    fn test_expired_access_token_rejected() {
        let tokens = service_with(Duration::seconds(-60), Duration::days(7));
        let token = tokens.issue_access_token(Uuid::new_v4(), "a@b.com").unwrap();

        assert_eq!(tokens.verify_access_token(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_refresh_token_rejected() {
        let tokens = service_with(Duration::hours(1), Duration::seconds(-60));
        let token = tokens.issue_refresh_token(Uuid::new_v4()).unwrap();

        assert_eq!(tokens.verify_refresh_token(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let tokens = service();
        let access = tokens.issue_access_token(Uuid::new_v4(), "a@b.com").unwrap();

        assert_eq!(tokens.verify_refresh_token(&access), Err(TokenError::Invalid));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let tokens = service();
        let refresh = tokens.issue_refresh_token(Uuid::new_v4()).unwrap();

        assert_eq!(tokens.verify_access_token(&refresh), Err(TokenError::Invalid));
    }

    #[test]
    fn test_token_from_other_deployment_rejected() {
        let ours = service();
        let theirs = TokenService::new(
            &AuthConfig::new(
                "another-access-secret-0123456789abcdef",
                "another-refresh-secret-0123456789abcdef",
                Duration::hours(1),
                Duration::days(7),
            )
            .unwrap(),
        );

        let foreign = theirs.issue_refresh_token(Uuid::new_v4()).unwrap();
        assert_eq!(ours.verify_refresh_token(&foreign), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = service();

        assert_eq!(tokens.verify_refresh_token("garbage"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify_refresh_token("a.b.c"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_token_errors_map_to_invalid_token() {
        assert!(matches!(AppError::from(TokenError::Malformed), AppError::InvalidToken));
        assert!(matches!(AppError::from(TokenError::Invalid), AppError::InvalidToken));
        assert!(matches!(
            AppError::from(TokenError::Signing("boom".into())),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_out_of_range_lifetime_fails_without_panicking() {
        let huge = Duration::try_days(100_000_000).unwrap();
        let tokens = service_with(huge, huge);

        assert!(matches!(
            tokens.issue_access_token(Uuid::new_v4(), "a@b.com"),
            Err(TokenError::Signing(_))
        ));
        assert!(matches!(
            tokens.issue_refresh_token(Uuid::new_v4()),
            Err(TokenError::Signing(_))
        ));
    }
}
