//! Common test utilities for integration tests
//!
//! Builds the real router over in-memory users, tasks, cache and object
//! storage, and drives it with `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use taskdeck_api::{
    app::{build_router, AppState, Dependencies},
    config::Config,
};
use taskdeck_shared::{
    cache::MemoryCache,
    storage::{MemoryStorage, ObjectStorage},
    store::memory::MemoryStore,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const PASSWORD: &str = "123456";

const BOUNDARY: &str = "taskdeck-test-boundary";

/// Test context holding the router and handles to its in-memory dependencies
pub struct TestContext {
    pub app: Router,
    pub config: Config,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub storage: Option<Arc<MemoryStorage>>,
}

/// A decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestContext {
    /// Context with object storage configured and a fail-open cache
    pub fn new() -> Self {
        Self::build(true, true)
    }

    /// Context without object storage
    pub fn without_storage() -> Self {
        Self::build(false, true)
    }

    /// Context whose cache failures surface as errors
    pub fn fail_closed() -> Self {
        Self::build(true, false)
    }

    fn build(with_storage: bool, fail_open: bool) -> Self {
        let vars: HashMap<&str, String> = HashMap::from([
            ("DATABASE_URL", "postgresql://unused/test".to_string()),
            ("JWT_SECRET", JWT_SECRET.to_string()),
            ("CACHE_FAIL_OPEN", fail_open.to_string()),
            ("STORAGE_TIMEOUT_SECS", "5".to_string()),
        ]);
        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();

        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let storage = with_storage.then(|| Arc::new(MemoryStorage::default()));

        let state = AppState::new(
            Dependencies {
                users: store.clone(),
                tasks: store.clone(),
                cache: cache.clone(),
                storage: storage
                    .clone()
                    .map(|s| s as Arc<dyn ObjectStorage>),
            },
            config.clone(),
        )
        .unwrap();

        Self {
            app: build_router(state),
            config,
            store,
            cache,
            storage,
        }
    }

    /// Sends a request with an optional JSON body and bearer token
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Sends a prepared request
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body), None).await
    }

    /// Registers a user and returns its ID
    pub async fn register(&self, name: &str, email: &str) -> Uuid {
        let response = self
            .post(
                "/auth/register",
                serde_json::json!({ "name": name, "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response.body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Logs in and returns the bearer token
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .post(
                "/auth/login",
                serde_json::json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        response.body["token"].as_str().unwrap().to_string()
    }

    /// Registers a fresh user and logs in
    pub async fn signed_in_user(&self) -> (Uuid, String) {
        let email = format!("user-{}@example.com", Uuid::new_v4());
        let id = self.register("Test User", &email).await;
        let token = self.login(&email).await;
        (id, token)
    }

    /// Sends a single-file multipart request
    pub async fn upload(
        &self,
        uri: &str,
        token: Option<&str>,
        field: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}
