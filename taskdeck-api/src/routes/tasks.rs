//! Task endpoints
//!
//! ```text
//! GET    /tasks       list (served from cache when fresh)
//! POST   /tasks       { "description": "buy milk" }
//! GET    /tasks/:id
//! PUT    /tasks/:id   { "description"?: "...", "completed"?: true }
//! DELETE /tasks/:id
//! ```

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use taskdeck_shared::models::task::{CreateTask, Task, UpdateTask};
use uuid::Uuid;

use super::{optional_text, required_text};
use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiPath, ApiResult},
};

/// Create task request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateTaskRequest {
    pub description: Option<String>,
}

/// Update task request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTaskRequest {
    pub description: Option<String>,
    pub completed: Option<bool>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Lists every task, oldest first
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.tasks.list().await?))
}

/// Creates an uncompleted task
pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let mut errors = Vec::new();
    let Some(description) = required_text("description", req.description, &mut errors) else {
        return Err(ApiError::ValidationError(errors));
    };

    let task = state.tasks.create(CreateTask { description }).await?;

    tracing::info!(task_id = %task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// Returns one task
pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks.find_by_id(id).await?.ok_or_else(not_found)?;
    Ok(Json(task))
}

/// Updates description and/or completion
pub async fn update_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let mut errors = Vec::new();
    let description = optional_text("description", req.description, &mut errors);
    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    let task = state
        .tasks
        .update(
            id,
            UpdateTask {
                description,
                completed: req.completed,
            },
        )
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(task_id = %task.id, "Task updated");
    Ok(Json(task))
}

/// Deletes a task
pub async fn delete_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.tasks.delete(id).await? {
        return Err(not_found());
    }

    tracing::info!(task_id = %id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}
