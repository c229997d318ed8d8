//! Object storage for avatar images
//!
//! - `supabase`: Supabase Storage over its HTTP API
//! - `memory`: in-process storage for tests
//! - `avatar`: turning uploads, data URIs and remote URLs into avatar URLs

pub mod avatar;
pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

pub use avatar::{AvatarError, AvatarIngestor, AvatarSource};
pub use memory::MemoryStorage;
pub use supabase::SupabaseStorage;

/// Default object name when a file name is missing
pub const DEFAULT_FILE_NAME: &str = "upload.bin";

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Nothing to upload
    #[error("Upload payload is empty")]
    EmptyPayload,

    /// Invalid storage configuration
    #[error("Storage configuration error: {0}")]
    Config(String),

    /// The storage service answered with a non-success status
    #[error("Storage rejected upload ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Transport failure
    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Connection settings for the storage service
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Service base URL, e.g. `https://project.supabase.co`
    pub url: String,

    /// Service role key
    pub key: String,

    /// Bucket objects are written to
    pub bucket: String,

    /// Request timeout for uploads and remote fetches
    pub timeout_secs: u64,
}

/// An object to upload
#[derive(Debug, Clone)]
pub struct UploadObject {
    /// Explicit object path inside the bucket
    pub path: Option<String>,

    /// Directory used when `path` is not given
    pub prefix: Option<String>,

    /// Original file name, used when `path` is not given
    pub file_name: Option<String>,

    /// Object contents
    pub bytes: Bytes,

    /// MIME type sent with the object
    pub content_type: String,

    /// Overwrite an existing object at the same path
    pub upsert: bool,
}

impl UploadObject {
    /// Upload to a fixed path, overwriting
    pub fn at_path(path: impl Into<String>, bytes: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            prefix: None,
            file_name: None,
            bytes,
            content_type: content_type.into(),
            upsert: true,
        }
    }

    /// Path the object will be written to
    ///
    /// An explicit `path` wins (leading slashes dropped). Otherwise the
    /// sanitized file name goes under `prefix`, with a unique suffix in front
    /// unless upserting.
    pub fn object_path(&self) -> String {
        if let Some(path) = self.path.as_deref() {
            let path = path.trim_start_matches('/');
            if !path.is_empty() {
                return path.to_string();
            }
        }

        let file_name = sanitize_file_name(self.file_name.as_deref());
        let file_name = if self.upsert {
            file_name
        } else {
            format!(
                "{}-{}-{}",
                chrono::Utc::now().timestamp_millis(),
                Uuid::new_v4(),
                file_name
            )
        };

        match self
            .prefix
            .as_deref()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
        {
            Some(prefix) => format!("{}/{}", prefix, file_name),
            None => file_name,
        }
    }
}

/// Where an uploaded object ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub public_url: String,
}

/// Blob storage with public URLs
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads an object and returns its public location
    async fn upload(&self, object: UploadObject) -> Result<StoredObject, StorageError>;

    /// Public URL of the object at `path`
    fn public_url(&self, path: &str) -> String;
}

/// Replaces anything outside `[A-Za-z0-9._-]` with `_`
pub fn sanitize_file_name(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
        _ => DEFAULT_FILE_NAME.to_string(),
    }
}
