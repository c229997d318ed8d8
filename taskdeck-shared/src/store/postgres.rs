//! PostgreSQL-backed stores

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Users and tasks stored in PostgreSQL
///
/// Cloning is cheap: the pool is reference counted.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an open connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool (for migrations and shutdown)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn first(&self) -> Result<Option<User>, StoreError> {
        Ok(User::first(&self.pool).await?)
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        Ok(User::update(&self.pool, id, data).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list(&self.pool).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn create(&self, data: CreateTask) -> Result<Task, StoreError> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}
