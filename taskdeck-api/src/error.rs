//! Error handling for the API server
//!
//! Every handler returns [`ApiResult`]. Errors from the shared crate convert
//! into [`ApiError`] with `?`, and [`ApiError`] renders as
//!
//! ```json
//! { "error": "<code>", "message": "<text>", "details": [{ "field": "...", "message": "..." }] }
//! ```
//!
//! Internal errors are logged and replaced by a generic message.
//!
//! # Example
//!
//! ```
//! use taskdeck_api::error::{ApiError, ApiResult};
//! use axum::Json;
//! use serde_json::{json, Value};
//!
//! async fn handler(id: Option<u32>) -> ApiResult<Json<Value>> {
//!     let id = id.ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
//!     Ok(Json(json!({ "id": id })))
//! }
//! ```

use std::fmt;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{jwt::JwtError, middleware::AuthError, password::PasswordError},
    cache::TaskCacheError,
    storage::{AvatarError, StorageError},
    store::{SeedError, StoreError},
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Field validation failed (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Duplicate resource, e.g. an email already registered (400)
    Conflict(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Request body over the configured limit (413)
    PayloadTooLarge(String),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg, None)
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "Service temporarily unavailable".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// JSON body extractor whose rejections use the API error envelope
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections use the API error envelope
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge("Request body is too large".to_string());
        }
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge("Request body is too large".to_string());
        }
        ApiError::BadRequest(err.body_text())
    }
}

/// Convert derive-validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    ValidationErrorDetail::new(field.to_string(), message)
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } if field == "email" => {
                ApiError::Conflict("Email already registered".to_string())
            }
            StoreError::Duplicate { field } => {
                ApiError::Conflict(format!("Duplicate value for {}", field))
            }
            StoreError::Database(msg) => ApiError::InternalError(format!("Database error: {}", msg)),
        }
    }
}

impl From<SeedError> for ApiError {
    fn from(err: SeedError) -> Self {
        match err {
            SeedError::Store(e) => e.into(),
            SeedError::Password(e) => e.into(),
        }
    }
}

/// Convert task cache errors to API errors
impl From<TaskCacheError> for ApiError {
    fn from(err: TaskCacheError) -> Self {
        match err {
            TaskCacheError::Store(e) => e.into(),
            TaskCacheError::Unavailable(e) => ApiError::ServiceUnavailable(e.to_string()),
            TaskCacheError::Invalidation(e) => {
                ApiError::InternalError(format!("Task cache invalidation failed: {}", e))
            }
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Token issuing failures are internal; verification failures arrive as [`AuthError`]
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::InternalError(format!("Token operation failed: {}", err))
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::InternalError(format!("Storage error: {}", err))
    }
}

/// Convert avatar ingestion errors to API errors
impl From<AvatarError> for ApiError {
    fn from(err: AvatarError) -> Self {
        match err {
            AvatarError::MissingFile
            | AvatarError::EmptyFile
            | AvatarError::InvalidDataUri(_)
            | AvatarError::UnsupportedPhoto => ApiError::BadRequest(err.to_string()),
            AvatarError::StorageNotConfigured => ApiError::InternalError(err.to_string()),
            AvatarError::Storage(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Conflict("dup".into()), StatusCode::BAD_REQUEST),
            (ApiError::ValidationError(vec![]), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (ApiError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let err: ApiError = StoreError::Duplicate {
            field: "email".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_avatar_error_mapping() {
        assert!(matches!(
            ApiError::from(AvatarError::MissingFile),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(AvatarError::StorageNotConfigured),
            ApiError::InternalError(_)
        ));
    }

    #[test]
    fn test_auth_error_messages() {
        let err: ApiError = AuthError::MissingCredentials.into();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Token not sent"));

        let err: ApiError = AuthError::InvalidToken(None).into();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid or expired token"));
    }
}
