//! Avatar upload
//!
//! ```text
//! PUT /users/:id/avatar
//! Authorization: Bearer <token>
//! Content-Type: multipart/form-data; boundary=...
//!
//! avatar=<file>
//! ```
//!
//! Callers may only change their own avatar.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Extension, Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::middleware::AuthContext, models::user::UpdateUser, storage::AvatarError,
    storage::avatar::DEFAULT_CONTENT_TYPE,
};
use uuid::Uuid;

use super::profile::{load_user, ProfileResponse};
use crate::{
    app::AppState,
    error::{ApiError, ApiPath, ApiResult},
};

/// Multipart field holding the image
pub const AVATAR_FIELD: &str = "avatar";

/// Avatar upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct AvatarResponse {
    pub message: String,
    pub user: ProfileResponse,
}

struct AvatarFile {
    bytes: Bytes,
    content_type: String,
    file_name: Option<String>,
}

async fn read_avatar_field(multipart: &mut Multipart) -> ApiResult<AvatarFile> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(String::from);
        let content_type = field
            .content_type()
            .map(String::from)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let bytes = field.bytes().await?;

        return Ok(AvatarFile {
            bytes,
            content_type,
            file_name,
        });
    }

    Err(AvatarError::MissingFile.into())
}

/// Replaces a user's avatar with the uploaded image
///
/// # Errors
///
/// - `400`: no `avatar` file or an empty one
/// - `401`: missing or invalid token
/// - `403`: the token belongs to another user
/// - `404`: no such user
/// - `500`: storage not configured or the upload failed
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(user_id): ApiPath<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AvatarResponse>> {
    if !auth.is_self(user_id) {
        return Err(ApiError::Forbidden(
            "You can only change your own avatar".to_string(),
        ));
    }

    let user = load_user(&state, user_id).await?;

    let mut multipart = multipart?;
    let file = read_avatar_field(&mut multipart).await?;

    let public_url = state
        .avatars
        .store_bytes(
            user.id,
            file.bytes,
            &file.content_type,
            file.file_name.as_deref(),
        )
        .await?;

    let updated = state
        .users
        .update(
            user.id,
            UpdateUser {
                avatar_url: Some(Some(public_url)),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %updated.id, "Avatar updated");

    Ok(Json(AvatarResponse {
        message: "Avatar updated".to_string(),
        user: updated.into(),
    }))
}
