//! Avatar ingestion
//!
//! An avatar reaches the service in one of three forms:
//!
//! - a multipart file upload
//! - a `data:<mime>;base64,<payload>` URI
//! - an `http(s)://` URL to copy from
//!
//! Bytes end up at `avatars/<user_id>/avatar.<ext>` (overwritten on every
//! upload) and the user's `avatar_url` becomes the object's public URL. A
//! remote URL that cannot be copied is kept as the avatar URL itself,
//! truncated to fit the column.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{Bytes, BytesMut};
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ObjectStorage, StorageError, UploadObject};
use crate::models::user::AVATAR_URL_MAX_LEN;

/// MIME type used when none is declared
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Avatar ingestion errors
#[derive(Error, Debug)]
pub enum AvatarError {
    /// The upload had no `avatar` file
    #[error("Avatar image is required")]
    MissingFile,

    /// The uploaded or decoded file has no bytes
    #[error("Avatar image is empty")]
    EmptyFile,

    /// A `data:` URI that cannot be decoded
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// `photo` is neither a data URI, an HTTP(S) URL nor empty
    #[error("photo must be a data URI or an http(s) URL")]
    UnsupportedPhoto,

    /// Storage is needed but not configured
    #[error("Object storage is not configured")]
    StorageNotConfigured,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A parsed `photo` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSource {
    /// Remove the avatar
    Clear,

    /// Inline image bytes
    DataUri { content_type: String, bytes: Bytes },

    /// Image to copy from a remote server
    Remote(String),
}

impl AvatarSource {
    /// Classifies a `photo` string
    pub fn parse(photo: &str) -> Result<Self, AvatarError> {
        let photo = photo.trim();

        if photo.is_empty() {
            return Ok(AvatarSource::Clear);
        }

        if let Some(rest) = strip_prefix_ignore_case(photo, "data:") {
            return parse_data_uri(rest);
        }

        if strip_prefix_ignore_case(photo, "http://").is_some()
            || strip_prefix_ignore_case(photo, "https://").is_some()
        {
            return Ok(AvatarSource::Remote(photo.to_string()));
        }

        Err(AvatarError::UnsupportedPhoto)
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

fn parse_data_uri(rest: &str) -> Result<AvatarSource, AvatarError> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AvatarError::InvalidDataUri("missing ',' separator".to_string()))?;

    let content_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| AvatarError::InvalidDataUri("only base64 payloads are supported".to_string()))?;

    let content_type = if content_type.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        content_type.to_ascii_lowercase()
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AvatarError::InvalidDataUri(e.to_string()))?;

    if bytes.is_empty() {
        return Err(AvatarError::EmptyFile);
    }

    Ok(AvatarSource::DataUri {
        content_type,
        bytes: Bytes::from(bytes),
    })
}

/// File extension for an avatar
///
/// Taken from the file name when it has one, else derived from the MIME
/// type, else `bin`.
pub fn extension_for(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(ext) = from_name {
        return ext.to_ascii_lowercase();
    }

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let known = match essence.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/avif" => Some("avif"),
        _ => None,
    };

    known
        .map(String::from)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&essence)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "bin".to_string())
}

/// Object path of a user's avatar
pub fn avatar_object_path(user_id: Uuid, extension: &str) -> String {
    format!("avatars/{}/avatar.{}", user_id, extension)
}

/// Cuts `url` down to the `avatar_url` column width
pub fn truncate_url(url: &str) -> String {
    url.chars().take(AVATAR_URL_MAX_LEN).collect()
}

/// Turns avatar input into a stored avatar URL
#[derive(Clone)]
pub struct AvatarIngestor {
    storage: Option<Arc<dyn ObjectStorage>>,
    http: reqwest::Client,
    max_bytes: usize,
}

impl AvatarIngestor {
    /// `storage` is `None` when object storage is not configured
    ///
    /// Remote fetches are bounded by `fetch_timeout` and read at most
    /// `max_bytes` of body.
    pub fn new(
        storage: Option<Arc<dyn ObjectStorage>>,
        fetch_timeout: Duration,
        max_bytes: usize,
    ) -> Result<Self, AvatarError> {
        let http = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(StorageError::from)?;

        Ok(Self {
            storage,
            http,
            max_bytes,
        })
    }

    /// Uploads image bytes as the user's avatar and returns the public URL
    pub async fn store_bytes(
        &self,
        user_id: Uuid,
        bytes: Bytes,
        content_type: &str,
        file_name: Option<&str>,
    ) -> Result<String, AvatarError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or(AvatarError::StorageNotConfigured)?;

        if bytes.is_empty() {
            return Err(AvatarError::EmptyFile);
        }

        let content_type = if content_type.trim().is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            content_type
        };

        let path = avatar_object_path(user_id, &extension_for(file_name, content_type));
        let stored = storage
            .upload(UploadObject::at_path(path, bytes, content_type))
            .await?;

        debug!(user_id = %user_id, path = %stored.path, "Stored avatar");
        Ok(stored.public_url)
    }

    /// Resolves a `photo` value to the new `avatar_url`
    ///
    /// `Ok(None)` clears the avatar.
    pub async fn ingest_photo(
        &self,
        user_id: Uuid,
        photo: &str,
    ) -> Result<Option<String>, AvatarError> {
        match AvatarSource::parse(photo)? {
            AvatarSource::Clear => Ok(None),
            AvatarSource::DataUri {
                content_type,
                bytes,
            } => self
                .store_bytes(user_id, bytes, &content_type, None)
                .await
                .map(Some),
            AvatarSource::Remote(url) => Ok(Some(self.copy_remote(user_id, &url).await)),
        }
    }

    /// Copies a remote image into storage, falling back to the URL itself
    async fn copy_remote(&self, user_id: Uuid, url: &str) -> String {
        if self.storage.is_none() {
            debug!(user_id = %user_id, "Storage not configured, keeping remote avatar URL");
            return truncate_url(url);
        }

        let (bytes, content_type) = match self.fetch(url).await {
            Ok(fetched) => fetched,
            Err(reason) => {
                warn!(user_id = %user_id, url = %url, reason = %reason, "Could not fetch remote avatar, keeping URL");
                return truncate_url(url);
            }
        };

        let file_name = reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.path_segments().and_then(|mut s| s.next_back().map(String::from)));

        match self
            .store_bytes(user_id, bytes, &content_type, file_name.as_deref())
            .await
        {
            Ok(public_url) => public_url,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Could not store remote avatar, keeping URL");
                truncate_url(url)
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<(Bytes, String), String> {
        let mut response = self.http.get(url).send().await.map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {}", status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .or_else(|| mime_guess::from_path(url).first().map(|m| m.to_string()))
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(format!("body of {} bytes exceeds {} byte limit", len, self.max_bytes));
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(format!("body exceeds {} byte limit", self.max_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            return Err("empty body".to_string());
        }

        Ok((body.freeze(), content_type))
    }
}
