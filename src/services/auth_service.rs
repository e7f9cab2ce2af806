//! Authentication service - sign-up, sign-in and token refresh.
//!
//! Onboarding moves a user record through `STEP1_COMPLETE -> COMPLETED`
//! (two-step flow) or straight to `COMPLETED` (single-step flow). Tokens are
//! issued on single-step sign-up and sign-in; refresh only ever mints a new
//! access token.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::sync::Arc;
use uuid::Uuid;

use super::token_service::{AccessClaims, TokenService};
use crate::domain::{NewUser, Password, ProfileDetails, User, UserType};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// Hash verified against when the email is unknown, so that a miss costs
/// the same as a wrong password.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    Password::new("timing-equalizer-0")
        .map(Password::into_string)
        .unwrap_or_default()
});

/// Access + refresh token pair handed out on sign-up and sign-in
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Step 1 of the two-step sign-up
#[derive(Debug, Clone)]
pub struct StepOneRegistration {
    pub email: String,
    pub password: String,
    pub user_type: UserType,
    pub business_type: Option<String>,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Single-step sign-up: create a registered user and sign them in
    async fn sign_up(&self, email: String, password: String) -> AppResult<AuthTokens>;

    /// Two-step sign-up, step 1: create the record with credentials and type
    async fn sign_up_step_one(&self, registration: StepOneRegistration) -> AppResult<User>;

    /// Two-step sign-up, step 2: merge the profile and complete registration
    async fn sign_up_step_two(&self, user_id: Uuid, details: ProfileDetails) -> AppResult<User>;

    /// Verify credentials and issue a token pair
    async fn sign_in(&self, email: String, password: String) -> AppResult<AuthTokens>;

    /// Mint a new access token from a refresh token
    async fn refresh(&self, refresh_token: Option<String>) -> AppResult<String>;

    /// Verify an access token and extract claims
    fn verify_access_token(&self, token: &str) -> AppResult<AccessClaims>;
}

/// Concrete implementation of AuthService over a user repository.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        // Hash the dummy now so no request pays for it on an async worker
        Lazy::force(&DUMMY_HASH);
        Self { users, tokens }
    }

    fn issue_tokens(&self, user: &User) -> AppResult<AuthTokens> {
        Ok(AuthTokens {
            access_token: self.tokens.issue_access_token(user.id, &user.email)?,
            refresh_token: self.tokens.issue_refresh_token(user.id)?,
        })
    }

    async fn ensure_email_available(&self, email: &str) -> AppResult<()> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn sign_up(&self, email: String, password: String) -> AppResult<AuthTokens> {
        self.ensure_email_available(&email).await?;

        let password_hash = hash_password(password).await?;
        let user = self
            .users
            .create(NewUser::single_step(email, password_hash))
            .await?;
        tracing::info!(user_id = %user.id, "User signed up");

        self.issue_tokens(&user)
    }

    async fn sign_up_step_one(&self, registration: StepOneRegistration) -> AppResult<User> {
        let StepOneRegistration {
            email,
            password,
            user_type,
            business_type,
        } = registration;

        let business_type = business_type.filter(|t| !t.trim().is_empty());
        if user_type.is_business() && business_type.is_none() {
            return Err(AppError::validation(
                "Business type is required for business users",
            ));
        }

        self.ensure_email_available(&email).await?;

        let password_hash = hash_password(password).await?;
        let user = self
            .users
            .create(NewUser::step_one(email, password_hash, user_type, business_type))
            .await?;
        tracing::info!(user_id = %user.id, user_type = %user.user_type, "Sign-up step 1 completed");

        Ok(user)
    }

    async fn sign_up_step_two(&self, user_id: Uuid, details: ProfileDetails) -> AppResult<User> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        user.complete_registration(details);
        let user = self.users.update(&user).await?;
        tracing::info!(user_id = %user.id, "Sign-up step 2 completed");

        Ok(user)
    }

    async fn sign_in(&self, email: String, password: String) -> AppResult<AuthTokens> {
        let user = self.users.find_by_email(&email).await?;

        let stored_hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => DUMMY_HASH.clone(),
        };
        let password_valid = verify_password(stored_hash, password).await?;

        let user = match user {
            Some(user) if password_valid => user,
            _ => {
                tracing::debug!("Sign-in rejected");
                return Err(AppError::InvalidCredentials);
            }
        };

        self.issue_tokens(&user)
    }

    async fn refresh(&self, refresh_token: Option<String>) -> AppResult<String> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AppError::MissingToken)?;

        let claims = self.tokens.verify_refresh_token(&token).map_err(|e| {
            tracing::debug!(error = %e, "Refresh token rejected");
            AppError::InvalidToken
        })?;

        // The subject may have been removed since the token was issued
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        Ok(self.tokens.issue_access_token(user.id, &user.email)?)
    }

    fn verify_access_token(&self, token: &str) -> AppResult<AccessClaims> {
        Ok(self.tokens.verify_access_token(token)?)
    }
}

/// bcrypt is CPU-bound; keep it off the async workers.
async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || Password::new(&password).map(Password::into_string))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))?
}

async fn verify_password(hash: String, password: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || Password::from_hash(hash).verify(&password))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {}", e)))
}
