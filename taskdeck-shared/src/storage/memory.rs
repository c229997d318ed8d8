//! In-process object storage for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use super::{ObjectStorage, StorageError, StoredObject, UploadObject};

/// A stored blob and its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Objects kept in a map, served from a fake public base URL
pub struct MemoryStorage {
    base_url: String,
    bucket: String,
    objects: Mutex<HashMap<String, MemoryObject>>,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            objects: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every upload fail with a 500 rejection
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The object stored at `path`
    pub async fn object(&self, path: &str) -> Option<MemoryObject> {
        self.objects.lock().await.get(path).cloned()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("http://storage.test", "avatars")
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, object: UploadObject) -> Result<StoredObject, StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected {
                status: 500,
                message: "storage unavailable".to_string(),
            });
        }
        if object.bytes.is_empty() {
            return Err(StorageError::EmptyPayload);
        }

        let path = object.object_path();
        let mut objects = self.objects.lock().await;

        if !object.upsert && objects.contains_key(&path) {
            return Err(StorageError::Rejected {
                status: 409,
                message: "The resource already exists".to_string(),
            });
        }

        objects.insert(
            path.clone(),
            MemoryObject {
                bytes: object.bytes,
                content_type: object.content_type,
            },
        );

        Ok(StoredObject {
            bucket: self.bucket.clone(),
            public_url: self.public_url(&path),
            path,
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}
