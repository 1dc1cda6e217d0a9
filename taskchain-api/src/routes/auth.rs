/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login with username or email
/// - `POST /v1/auth/refresh` - Refresh access token
/// - `POST /v1/auth/verify-email` - Confirm an email address
/// - `POST /v1/auth/password-reset` - Request a password reset token
/// - `POST /v1/auth/password-reset/confirm` - Set a new password
///
/// One-time tokens are returned in the response body only outside
/// production; in production they are meant to travel by email, which this
/// server does not send.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskchain_shared::{
    auth::{
        jwt, password,
        token::{self, TokenError, TokenPurpose},
    },
    models::user::{CreateUser, User},
};
use validator::{Validate, ValidationError};

/// Usernames are task owners, so they are compared verbatim and may not
/// carry whitespace or an `@` (which marks an email login).
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().any(|c| c.is_whitespace() || c == '@') {
        let mut err = ValidationError::new("username");
        err.message = Some("Username may not contain spaces or '@'".into());
        return Err(err);
    }
    Ok(())
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Login name, also used as task owner
    #[validate(
        length(min = 1, max = 100, message = "Username must be 1 to 100 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (strength checked separately)
    pub password: String,
}

/// Token pair returned by register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// User ID
    pub user_id: String,

    /// Username
    pub username: String,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    /// Email verification token (registration only, non-production only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verification_token: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email address
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,

    /// Password
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Email verification request
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// Email verification response
#[derive(Debug, Serialize)]
pub struct VerifyEmailResponse {
    pub user_id: String,
    pub email_verified: bool,
}

/// Password reset request
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Password reset response
///
/// Identical whether or not the email is registered.
#[derive(Debug, Serialize)]
pub struct PasswordResetResponse {
    pub message: String,

    /// Reset token (non-production only, and only for a known email)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

/// Password reset confirmation
#[derive(Debug, Deserialize)]
pub struct ConfirmPasswordResetRequest {
    pub token: String,
    pub new_password: String,
}

/// Issues the access/refresh pair for `user`
fn issue_tokens(state: &AppState, user: &User) -> ApiResult<(String, String)> {
    let access_claims = jwt::Claims::new(user.id, user.username.as_str(), jwt::TokenType::Access);
    let refresh_claims =
        jwt::Claims::new(user.id, user.username.as_str(), jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;
    Ok((access_token, refresh_token))
}

/// Register a new user
///
/// ```text
/// POST /v1/auth/register
///
/// { "username": "alice", "email": "alice@example.com", "password": "s3cretpass" }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: username or email already exists
/// - `422 Unprocessable Entity`: validation failed or password too weak
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;
    password::validate_password_strength(&req.password)?;

    let password_hash = password::hash_password(&req.password)?;

    let verification = token::issue(TokenPurpose::EmailVerification, Utc::now());
    let user = User::create_with_verification(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
        },
        &verification.hash,
        verification.expires_at,
    )
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let (access_token, refresh_token) = issue_tokens(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id: user.id.to_string(),
            username: user.username,
            access_token,
            refresh_token,
            email_verification_token: (!state.config.api.production)
                .then_some(verification.token),
        }),
    ))
}

/// Login with username or email
///
/// # Errors
///
/// - `401 Unauthorized`: unknown login or wrong password (indistinguishable)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid login or password".to_string());

    let user = User::find_by_login(&state.db, req.login.trim())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    User::update_last_login(&state.db, user.id).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

    let (access_token, refresh_token) = issue_tokens(&state, &user)?;

    Ok(Json(AuthResponse {
        user_id: user.id.to_string(),
        username: user.username,
        access_token,
        refresh_token,
        email_verification_token: None,
    }))
}

/// Exchanges a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Consumes an email verification token
///
/// # Errors
///
/// - `400 Bad Request`: malformed, unknown, or expired token
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> ApiResult<Json<VerifyEmailResponse>> {
    let token_hash = token::parse(&req.token)?;

    let user = User::verify_email(&state.db, &token_hash)
        .await?
        .ok_or(TokenError::InvalidOrExpired)?;

    tracing::info!(user_id = %user.id, "Email verified");

    Ok(Json(VerifyEmailResponse {
        user_id: user.id.to_string(),
        email_verified: user.email_verified,
    }))
}

/// Issues a password reset token for a registered email
///
/// Always answers 202 so the endpoint cannot be used to discover which
/// addresses are registered.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<(StatusCode, Json<PasswordResetResponse>)> {
    req.validate()?;

    let mut reset_token = None;
    if let Some(user) = User::find_by_email(&state.db, req.email.trim()).await? {
        let issued = token::issue(TokenPurpose::PasswordReset, Utc::now());
        User::set_password_reset_token(&state.db, user.id, &issued.hash, issued.expires_at)
            .await?;

        tracing::info!(user_id = %user.id, "Password reset requested");
        if !state.config.api.production {
            reset_token = Some(issued.token);
        }
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(PasswordResetResponse {
            message: "If the address is registered, a reset token has been issued".to_string(),
            reset_token,
        }),
    ))
}

/// Sets a new password using a reset token
///
/// # Errors
///
/// - `400 Bad Request`: malformed, unknown, or expired token
/// - `422 Unprocessable Entity`: new password too weak
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(req): Json<ConfirmPasswordResetRequest>,
) -> ApiResult<StatusCode> {
    let token_hash = token::parse(&req.token)?;
    password::validate_password_strength(&req.new_password)?;

    let new_hash = password::hash_password(&req.new_password)?;
    let user = User::reset_password(&state.db, &token_hash, &new_hash)
        .await?
        .ok_or(TokenError::InvalidOrExpired)?;

    tracing::info!(user_id = %user.id, "Password reset completed");
    Ok(StatusCode::NO_CONTENT)
}
