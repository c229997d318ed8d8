//! Persistence seams
//!
//! The API never talks to a concrete database. It holds `Arc<dyn UserStore>`
//! and `Arc<dyn TaskStore>`, built once at startup:
//!
//! - [`postgres::PgStore`]: production implementation over a sqlx pool
//! - [`memory::MemoryStore`]: in-process implementation for tests and local runs
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskdeck_shared::store::{postgres::PgStore, TaskStore, UserStore};
//! use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//! let store = Arc::new(PgStore::new(pool));
//!
//! let users: Arc<dyn UserStore> = store.clone();
//! let tasks: Arc<dyn TaskStore> = store;
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::password::{self, PasswordError};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated (e.g. duplicate email)
    #[error("Duplicate value for {field}")]
    Duplicate {
        /// Column that must be unique
        field: String,
    },

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some(constraint) if constraint.contains("email") => "email".to_string(),
                    Some(constraint) => constraint.to_string(),
                    None => "unknown".to_string(),
                };
                return StoreError::Duplicate { field };
            }
        }

        StoreError::Database(err.to_string())
    }
}

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user; `StoreError::Duplicate` if the email is taken
    async fn create(&self, data: CreateUser) -> Result<User, StoreError>;

    /// Finds a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Finds a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Returns the oldest user, if any
    async fn first(&self) -> Result<Option<User>, StoreError>;

    /// Applies an update; `None` if the user does not exist
    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError>;
}

/// Task store
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Lists every task, oldest first
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    /// Finds a task by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Creates an uncompleted task
    async fn create(&self, data: CreateTask) -> Result<Task, StoreError>;

    /// Applies an update; `None` if the task does not exist
    async fn update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError>;

    /// Deletes a task; `false` if it did not exist
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Checks the backing store is reachable
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Credentials of the development user created by [`ensure_default_user`]
pub const DEFAULT_USER_NAME: &str = "User";
pub const DEFAULT_USER_EMAIL: &str = "user@example.com";
pub const DEFAULT_USER_PASSWORD: &str = "123456";

/// Errors from [`ensure_default_user`]
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Makes sure at least one user exists, creating the development user if not
///
/// Returns the existing oldest user or the newly created one.
pub async fn ensure_default_user(users: &dyn UserStore) -> Result<User, SeedError> {
    if let Some(user) = users.first().await? {
        return Ok(user);
    }

    let password_hash = password::hash(DEFAULT_USER_PASSWORD.to_string()).await?;

    let user = users
        .create(CreateUser {
            name: DEFAULT_USER_NAME.to_string(),
            email: DEFAULT_USER_EMAIL.to_string(),
            password_hash,
            avatar_url: None,
        })
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Created default development user");
    Ok(user)
}
