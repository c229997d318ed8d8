//! Authentication endpoints
//!
//! - `POST /auth/register` - create an account
//! - `POST /auth/login` (alias `POST /auth/signin`) - exchange credentials for a bearer token

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{jwt, password},
    models::user::CreateUser,
};
use uuid::Uuid;
use validator::Validate;

use super::required_text;
use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiResult, ValidationErrorDetail},
};

/// Register request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    /// Display name
    pub name: Option<String>,

    /// Email address
    pub email: Option<String>,

    /// Plaintext password, hashed before storage
    pub password: Option<String>,
}

/// Trimmed registration fields, checked against column limits
#[derive(Debug, Validate)]
struct NewAccount {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    name: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    email: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,

    /// New user ID
    pub id: Uuid,
}

/// Login request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token valid for one day
    pub token: String,
}

/// Register a new user
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// { "name": "Ana", "email": "ana@example.com", "password": "secret" }
/// ```
///
/// Answers `201 { "message": "...", "id": "<uuid>" }`.
///
/// # Errors
///
/// - `400`: a field is missing or blank, the email is malformed or already registered
/// - `500`: server error
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let mut errors = Vec::new();
    let name = required_text("name", req.name, &mut errors);
    let email = required_text("email", req.email, &mut errors);
    let password = req.password.filter(|p| !p.trim().is_empty());
    if password.is_none() {
        errors.push(ValidationErrorDetail::new(
            "password",
            "password is required",
        ));
    }

    let (Some(name), Some(email), Some(password)) = (name, email, password) else {
        return Err(ApiError::ValidationError(errors));
    };

    let account = NewAccount { name, email };
    account.validate()?;

    let password_hash = password::hash(password).await?;

    let user = state
        .users
        .create(CreateUser {
            name: account.name,
            email: account.email,
            password_hash,
            avatar_url: None,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            id: user.id,
        }),
    ))
}

/// Log in with email and password
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "email": "ana@example.com", "password": "secret" }
/// ```
///
/// Answers `200 { "token": "<jwt>" }`. The token's claims carry the user ID
/// (`sub`) and email.
///
/// # Errors
///
/// - `400`: a field is missing
/// - `404`: no account with this email
/// - `401`: wrong password
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let mut errors = Vec::new();
    let email = required_text("email", req.email, &mut errors);
    let password = req.password.filter(|p| !p.is_empty());
    if password.is_none() {
        errors.push(ValidationErrorDetail::new(
            "password",
            "password is required",
        ));
    }

    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::ValidationError(errors));
    };

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify(password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::Unauthorized("Incorrect password".to_string()));
    }

    let token = jwt::issue_token(user.id, &user.email, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse { token }))
}
