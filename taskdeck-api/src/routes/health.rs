//! Health check endpoint
//!
//! ```text
//! GET /health
//! ```
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "database": "connected",
//!   "cache": "connected"
//! }
//! ```
//!
//! Always answers 200; `status` is `degraded` when either dependency is down.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    /// Cache status
    pub cache: String,
}

fn label(ok: bool) -> &'static str {
    if ok {
        "connected"
    } else {
        "disconnected"
    }
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (database, cache) = tokio::join!(state.tasks.store().ping(), state.tasks.cache().ping());

    if let Err(e) = &database {
        tracing::warn!(error = %e, "Database health check failed");
    }
    if let Err(e) = &cache {
        tracing::warn!(error = %e, "Cache health check failed");
    }

    let healthy = database.is_ok() && cache.is_ok();

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: label(database.is_ok()).to_string(),
        cache: label(cache.is_ok()).to_string(),
    })
}
