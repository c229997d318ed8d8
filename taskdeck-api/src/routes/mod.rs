//! API route handlers
//!
//! - `health`: liveness and dependency status
//! - `auth`: registration and login
//! - `profile`: the caller's own profile
//! - `tasks`: task CRUD with a cached list
//! - `avatar`: avatar file uploads

pub mod auth;
pub mod avatar;
pub mod health;
pub mod profile;
pub mod tasks;

use crate::error::ValidationErrorDetail;

/// Takes a required text field, trimmed
///
/// Records a validation error and returns `None` when the field is absent or blank.
pub(crate) fn required_text(
    field: &str,
    value: Option<String>,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.push(ValidationErrorDetail::new(field, format!("{} is required", field)));
            None
        }
    }
}

/// Like [`required_text`] but absence is fine; only a blank value is an error
pub(crate) fn optional_text(
    field: &str,
    value: Option<String>,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<String> {
    value.and_then(|v| required_text(field, Some(v), errors))
}
