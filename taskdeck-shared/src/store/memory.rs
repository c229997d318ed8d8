//! In-process stores
//!
//! [`MemoryStore`] keeps users and tasks in a mutex-guarded map. It enforces
//! the same rules as the database (unique email, oldest-first listing) and
//! counts `list` calls so callers can observe whether a read reached the
//! store or was served from cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    tasks: HashMap<Uuid, Task>,
}

/// Users and tasks held in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    list_calls: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times [`TaskStore::list`] has run
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of stored tasks
    pub async fn task_count(&self) -> usize {
        self.tables.lock().await.tasks.len()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;

        if email_taken(&tables.users, &data.email, None) {
            return Err(StoreError::Duplicate {
                field: "email".to_string(),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            avatar_url: data.avatar_url,
            created_at: now,
            updated_at: now,
        };

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn first(&self) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .min_by_key(|u| (u.created_at, u.id))
            .cloned())
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.lock().await;

        if let Some(email) = data.email.as_deref() {
            if email_taken(&tables.users, email, Some(id)) {
                return Err(StoreError::Duplicate {
                    field: "email".to_string(),
                });
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(avatar_url) = data.avatar_url {
            user.avatar_url = avatar_url;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let tables = self.tables.lock().await;
        let mut tasks: Vec<Task> = tables.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.lock().await.tasks.get(&id).cloned())
    }

    async fn create(&self, data: CreateTask) -> Result<Task, StoreError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            description: data.description,
            completed: false,
            created_at: now,
            updated_at: now,
        };

        self.tables
            .lock()
            .await
            .tasks
            .insert(task.id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.lock().await;

        let Some(task) = tables.tasks.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(completed) = data.completed {
            task.completed = completed;
        }
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.tasks.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            name: "Ana".to_string(),
            email: email.to_string(),
            password_hash: "digest".to_string(),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("a@example.com"))
            .await
            .unwrap();

        let err = UserStore::create(&store, new_user("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { ref field } if field == "email"));
    }

    #[tokio::test]
    async fn test_update_email_to_taken_address_rejected() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("a@example.com"))
            .await
            .unwrap();
        let b = UserStore::create(&store, new_user("b@example.com"))
            .await
            .unwrap();

        let err = UserStore::update(
            &store,
            b.id,
            UpdateUser {
                email: Some("a@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));

        // Keeping your own email is fine
        let same = UserStore::update(
            &store,
            b.id,
            UpdateUser {
                email: Some("b@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn test_clear_avatar() {
        let store = MemoryStore::new();
        let mut data = new_user("a@example.com");
        data.avatar_url = Some("https://cdn.example.com/a.png".to_string());
        let user = UserStore::create(&store, data).await.unwrap();

        let updated = UserStore::update(
            &store,
            user.id,
            UpdateUser {
                avatar_url: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert!(updated.avatar_url.is_none());
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let store = MemoryStore::new();

        let task = TaskStore::create(
            &store,
            CreateTask {
                description: "buy milk".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(!task.completed);

        let updated = TaskStore::update(
            &store,
            task.id,
            UpdateTask {
                completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert!(updated.completed);
        assert_eq!(updated.description, "buy milk");

        assert_eq!(store.list().await.unwrap().len(), 1);
        assert_eq!(store.list_calls(), 1);

        assert!(TaskStore::delete(&store, task.id).await.unwrap());
        assert!(!TaskStore::delete(&store, task.id).await.unwrap());
        assert!(TaskStore::update(&store, task.id, UpdateTask::default())
            .await
            .unwrap()
            .is_none());
    }
}
