//! The caller's profile
//!
//! - `GET /profile`
//! - `PUT /profile` with any of `name`, `email`, `photo`
//!
//! `photo` accepts a `data:` URI (uploaded to storage), an `http(s)` URL
//! (copied to storage when possible, else stored as given) or `""` to clear.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::middleware::AuthContext,
    models::user::{UpdateUser, User},
};
use uuid::Uuid;
use validator::Validate;

use super::optional_text;
use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiResult},
};

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,

    /// Avatar URL
    pub photo: Option<String>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            photo: user.avatar_url,
        }
    }
}

/// Profile update request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Validate)]
struct ProfileChanges {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    name: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    email: Option<String>,
}

pub(crate) async fn load_user(state: &AppState, id: Uuid) -> ApiResult<User> {
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Returns the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = load_user(&state, auth.user_id).await?;
    Ok(Json(user.into()))
}

/// Updates the caller's profile
///
/// Fields left out are unchanged. A new email must not belong to another user.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let mut errors = Vec::new();
    let changes = ProfileChanges {
        name: optional_text("name", req.name, &mut errors),
        email: optional_text("email", req.email, &mut errors),
    };
    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }
    changes.validate()?;

    let user = load_user(&state, auth.user_id).await?;

    // Checked before the photo is uploaded, since the upload overwrites in place
    if let Some(email) = changes.email.as_deref() {
        if let Some(owner) = state.users.find_by_email(email).await? {
            if owner.id != user.id {
                return Err(ApiError::Conflict("Email already registered".to_string()));
            }
        }
    }

    let avatar_url = match req.photo.as_deref() {
        Some(photo) => Some(state.avatars.ingest_photo(user.id, photo).await?),
        None => None,
    };

    let update = UpdateUser {
        name: changes.name,
        email: changes.email,
        avatar_url,
    };
    if update.is_empty() {
        return Ok(Json(user.into()));
    }

    let updated = state
        .users
        .update(user.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %updated.id, "Profile updated");
    Ok(Json(updated.into()))
}
