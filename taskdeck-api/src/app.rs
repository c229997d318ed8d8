//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskdeck_api::{app::{build_router, AppState, Dependencies}, config::Config};
//! use taskdeck_shared::{cache::MemoryCache, store::memory::MemoryStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let store = Arc::new(MemoryStore::new());
//!
//! let state = AppState::new(
//!     Dependencies {
//!         users: store.clone(),
//!         tasks: store,
//!         cache: Arc::new(MemoryCache::new()),
//!         storage: None,
//!     },
//!     config,
//! )?;
//!
//! let app = build_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self as axum_middleware, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use taskdeck_shared::{
    auth::middleware::authenticate,
    cache::{CacheStore, CachedTaskStore},
    storage::{AvatarIngestor, ObjectStorage},
    store::{TaskStore, UserStore},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, error::ApiError, routes};

/// External collaborators, opened by the caller
pub struct Dependencies {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub cache: Arc<dyn CacheStore>,

    /// `None` when object storage is not configured
    pub storage: Option<Arc<dyn ObjectStorage>>,
}

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,

    /// Task store behind the list cache
    pub tasks: CachedTaskStore,

    pub avatars: AvatarIngestor,

    pub config: Arc<Config>,
}

impl AppState {
    /// Wires dependencies together according to `config`
    pub fn new(deps: Dependencies, config: Config) -> anyhow::Result<Self> {
        let tasks = CachedTaskStore::new(
            deps.tasks,
            deps.cache,
            config.cache.ttl(),
            config.cache.fail_open,
        );
        let avatars = AvatarIngestor::new(
            deps.storage,
            config.storage.timeout(),
            config.api.max_body_bytes,
        )?;

        Ok(Self {
            users: deps.users,
            tasks,
            avatars,
            config: Arc::new(config),
        })
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /auth/
/// │   ├── POST /register
/// │   ├── POST /login
/// │   └── POST /signin
/// ├── /tasks
/// │   ├── GET    /            (cached list)
/// │   ├── POST   /
/// │   ├── GET    /:id
/// │   ├── PUT    /:id
/// │   └── DELETE /:id
/// ├── GET|PUT /profile        (bearer)
/// └── PUT  /users/:id/avatar  (bearer)
/// ```
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/signin", post(routes::auth::login));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    let protected_routes = Router::new()
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route("/users/:id/avatar", put(routes::avatar::upload_avatar))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(state.config.api.max_body_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Bearer authentication middleware
///
/// Verifies the token and injects [`AuthContext`](taskdeck_shared::auth::middleware::AuthContext)
/// into request extensions.
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret()).map_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "Rejected unauthenticated request");
        e
    })?;

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}
