//! Task model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     description TEXT NOT NULL CHECK (length(trim(description)) > 0),
//!     completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! Handlers never call these functions directly. They go through
//! [`crate::cache::CachedTaskStore`], which keeps the cached task list in
//! step with writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, description, completed, created_at, updated_at";

/// A to-do item
///
/// This is also the shape of each element in the cached `"tasks"` snapshot,
/// so it must round-trip through JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// What needs doing (never blank)
    pub description: String,

    /// Whether the task is done
    pub completed: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task. New tasks start uncompleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task description
    pub description: String,
}

/// Input for updating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New description
    pub description: Option<String>,

    /// New completion flag
    pub completed: Option<bool>,
}

impl Task {
    /// Inserts a task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (description, completed) VALUES ($1, FALSE) RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.description)
            .fetch_one(pool)
            .await
    }

    /// Lists every task, oldest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks ORDER BY created_at ASC, id ASC",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query).fetch_all(pool).await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Updates the `Some` fields of `data`
    ///
    /// Returns `None` if no task has this ID.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks \
             SET description = COALESCE($2, description), \
                 completed = COALESCE($3, completed), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(data.description)
            .bind(data.completed)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a task, returning whether a row was removed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
