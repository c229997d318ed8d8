//! # Taskdeck API Server
//!
//! Task management REST service: accounts with bearer tokens, profiles with
//! avatars in object storage, and tasks with a Redis-cached list.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... JWT_SECRET=... cargo run -p taskdeck-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use taskdeck_api::{
    app::{build_router, AppState, Dependencies},
    config::Config,
    telemetry,
};
use taskdeck_shared::{
    cache::{redis::sanitize_url, RedisCache, RedisConfig},
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    storage::{ObjectStorage, SupabaseStorage},
    store::{ensure_default_user, postgres::PgStore},
};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(config.log_format);

    info!(
        "Taskdeck API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .with_context(|| format!("failed to connect to {}", sanitize_url(&config.database.url)))?;

    run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let store = Arc::new(PgStore::new(pool.clone()));

    let cache = RedisCache::connect(RedisConfig::from_host_port(
        &config.redis.host,
        config.redis.port,
    ))
    .await
    .context("failed to connect to Redis")?;

    let storage: Option<Arc<dyn ObjectStorage>> = match config.storage.storage_config() {
        Some(storage_config) => {
            let storage = SupabaseStorage::new(storage_config)
                .context("invalid object storage configuration")?;
            info!(bucket = %storage.bucket(), "Object storage configured");
            Some(Arc::new(storage) as Arc<dyn ObjectStorage>)
        }
        None => {
            warn!("STORAGE_URL/STORAGE_KEY not set; avatar uploads are disabled");
            None
        }
    };

    if config.seed_default_user {
        ensure_default_user(store.as_ref())
            .await
            .context("failed to seed default user")?;
    }

    let bind_address = config.bind_address();
    let state = AppState::new(
        Dependencies {
            users: store.clone(),
            tasks: store,
            cache: Arc::new(cache),
            storage,
        },
        config,
    )?;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
