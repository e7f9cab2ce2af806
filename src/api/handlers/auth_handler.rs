//! Authentication handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::config::{
    MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, REFRESH_COOKIE_MAX_AGE_MS, REFRESH_COOKIE_NAME,
    REFRESH_COOKIE_PATH,
};
use crate::domain::{ProfileDetails, UserType};
use crate::errors::{AppError, AppResult};
use crate::services::StepOneRegistration;

const USER_REGISTERED: &str = "User registered successfully";

/// Single-step sign-up request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
}

/// Two-step sign-up, step 1 request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignUpStepOneRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    pub user_type: UserType,
    pub business_type: Option<String>,
}

/// Two-step sign-up, step 2 request.
///
/// `user_id` stays a string so that an id that is not a UUID reads as an
/// unknown user rather than a malformed body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignUpStepTwoRequest {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub company_name: Option<String>,
    pub registration_number: Option<String>,
}

/// Sign-in request. No format rules: bad credentials of any shape are a 401.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub success: &'static str,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOneResponse {
    pub success: &'static str,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-up/step1", post(sign_up_step_one))
        .route("/sign-up/step2", post(sign_up_step_two))
        .route("/sign-in", post(sign_in))
        .route("/refresh-token", post(refresh_token))
}

/// Register and sign in at once
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SignUpRequest>,
) -> AppResult<impl IntoResponse> {
    let tokens = state
        .auth_service
        .sign_up(payload.email, payload.password)
        .await?;

    let jar = jar.add(refresh_cookie(tokens.refresh_token, state.secure_cookies));
    let body = SignUpResponse {
        success: USER_REGISTERED,
        access_token: tokens.access_token,
    };

    Ok((StatusCode::CREATED, jar, Json(body)))
}

/// Create the user record with credentials and account type
pub async fn sign_up_step_one(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignUpStepOneRequest>,
) -> AppResult<(StatusCode, Json<StepOneResponse>)> {
    let user = state
        .auth_service
        .sign_up_step_one(StepOneRegistration {
            email: payload.email,
            password: payload.password,
            user_type: payload.user_type,
            business_type: payload.business_type,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StepOneResponse {
            success: "Step 1 completed",
            user_id: user.id,
        }),
    ))
}

/// Fill in the profile and complete registration
pub async fn sign_up_step_two(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignUpStepTwoRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse>)> {
    let user_id = Uuid::parse_str(&payload.user_id).map_err(|_| AppError::UserNotFound)?;

    let details = ProfileDetails {
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone_number: payload.phone_number,
        company_name: payload.company_name,
        registration_number: payload.registration_number,
    };

    state
        .auth_service
        .sign_up_step_two(user_id, details)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: USER_REGISTERED,
        }),
    ))
}

/// Sign in with email and password
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SignInRequest>,
) -> AppResult<impl IntoResponse> {
    let tokens = state
        .auth_service
        .sign_in(payload.email, payload.password)
        .await?;

    let jar = jar.add(refresh_cookie(tokens.refresh_token, state.secure_cookies));

    Ok((
        jar,
        Json(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    ))
}

/// Exchange the refresh cookie for a new access token
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<AccessTokenResponse>> {
    let refresh_token = jar
        .get(REFRESH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string());

    let access_token = state.auth_service.refresh(refresh_token).await?;

    Ok(Json(AccessTokenResponse { access_token }))
}

/// Refresh token cookie. `Secure` is only set in production.
fn refresh_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, token))
        .http_only(true)
        .secure(secure)
        .path(REFRESH_COOKIE_PATH)
        .max_age(time::Duration::milliseconds(REFRESH_COOKIE_MAX_AGE_MS))
        .build()
}

/// 6-20 characters with at least one lowercase letter and one digit.
fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count() as u64;
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(password_error(
            "password_length",
            format!(
                "Password must be {}-{} characters long",
                MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
            ),
        ));
    }

    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lowercase && has_digit) {
        return Err(password_error(
            "password_strength",
            "Password must contain at least one lowercase letter and one number".to_string(),
        ));
    }

    Ok(())
}

fn password_error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}
