//! Supabase Storage client
//!
//! Uploads go to `POST {url}/storage/v1/object/{bucket}/{path}` authenticated
//! with the service key; objects are served from
//! `{url}/storage/v1/object/public/{bucket}/{path}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};

use super::{ObjectStorage, StorageConfig, StorageError, StoredObject, UploadObject};

const CACHE_CONTROL_VALUE: &str = "max-age=3600";

/// Supabase Storage bucket
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    key: String,
    bucket: String,
}

impl SupabaseStorage {
    /// Builds a client for `config.bucket`
    ///
    /// # Errors
    ///
    /// Fails if the URL, key or bucket is empty or the HTTP client cannot be built.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        let key = config.key.trim().to_string();
        let bucket = config.bucket.trim().to_string();

        if base_url.is_empty() || key.is_empty() {
            return Err(StorageError::Config(
                "storage URL and key are required".to_string(),
            ));
        }
        if bucket.is_empty() {
            return Err(StorageError::Config("bucket name is required".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            key,
            bucket,
        })
    }

    /// Bucket objects are written to
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(&self, object: UploadObject) -> Result<StoredObject, StorageError> {
        if object.bytes.is_empty() {
            return Err(StorageError::EmptyPayload);
        }

        let path = object.object_path();
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        );

        tracing::debug!(bucket = %self.bucket, path = %path, size = object.bytes.len(), "Uploading object");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.key))
            .header("apikey", &self.key)
            .header("x-upsert", if object.upsert { "true" } else { "false" })
            .header(CONTENT_TYPE, object.content_type.as_str())
            .header(CACHE_CONTROL, CACHE_CONTROL_VALUE)
            .body(object.bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

            tracing::warn!(status = status.as_u16(), path = %path, "Storage rejected upload");
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: &str) -> StorageConfig {
        StorageConfig {
            url: format!("{}/", url),
            key: "service-key".to_string(),
            bucket: "avatars".to_string(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_upload_sends_expected_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/avatars/avatars/42/avatar.png"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("apikey", "service-key"))
            .and(header("x-upsert", "true"))
            .and(header("content-type", "image/png"))
            .and(header("cache-control", "max-age=3600"))
            .and(body_bytes(b"png-bytes".to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Key":"ok"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let storage = SupabaseStorage::new(config(&server.uri())).unwrap();
        let stored = storage
            .upload(UploadObject::at_path(
                "avatars/42/avatar.png",
                Bytes::from_static(b"png-bytes"),
                "image/png",
            ))
            .await
            .unwrap();

        assert_eq!(stored.bucket, "avatars");
        assert_eq!(stored.path, "avatars/42/avatar.png");
        assert_eq!(
            stored.public_url,
            format!(
                "{}/storage/v1/object/public/avatars/avatars/42/avatar.png",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_rejected_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
            .mount(&server)
            .await;

        let storage = SupabaseStorage::new(config(&server.uri())).unwrap();
        let err = storage
            .upload(UploadObject::at_path(
                "a.png",
                Bytes::from_static(b"x"),
                "image/png",
            ))
            .await
            .unwrap_err();

        match err {
            StorageError::Rejected { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_payload_is_not_sent() {
        let storage = SupabaseStorage::new(config("http://127.0.0.1:9")).unwrap();
        let err = storage
            .upload(UploadObject::at_path("a.png", Bytes::new(), "image/png"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::EmptyPayload));
    }

    #[test]
    fn test_config_validation() {
        let mut cfg = config("http://localhost");
        cfg.bucket = " ".to_string();
        assert!(matches!(
            SupabaseStorage::new(cfg),
            Err(StorageError::Config(_))
        ));

        let mut cfg = config("http://localhost");
        cfg.key = String::new();
        assert!(SupabaseStorage::new(cfg).is_err());
    }
}
