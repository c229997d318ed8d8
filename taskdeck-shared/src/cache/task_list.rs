//! Cache-aside task reads
//!
//! [`CachedTaskStore`] sits in front of a [`TaskStore`]:
//!
//! - `list` reads the `"tasks"` key first. A hit is returned as is; a miss
//!   (absent, expired or undecodable) loads from the store and writes the
//!   snapshot back with the configured TTL.
//! - `create`, `update` and `delete` delete the key after the store write
//!   succeeds. Writes never populate the cache.
//!
//! When the cache itself fails during a read, `fail_open` decides between
//! serving from the store and returning [`TaskCacheError::Unavailable`]. A
//! failed invalidation is always an error because the next read could
//! otherwise return a stale snapshot.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CacheError, CacheStore};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::store::{StoreError, TaskStore};

/// Cache key of the task list snapshot
pub const TASKS_KEY: &str = "tasks";

/// Errors from [`CachedTaskStore`]
#[derive(Error, Debug)]
pub enum TaskCacheError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Cache read failed and the policy is fail-closed
    #[error("Task cache unavailable: {0}")]
    Unavailable(#[source] CacheError),

    /// The store write succeeded but the snapshot could not be dropped
    #[error("Failed to invalidate task cache: {0}")]
    Invalidation(#[source] CacheError),
}

/// Task store with a cached list read
#[derive(Clone)]
pub struct CachedTaskStore {
    store: Arc<dyn TaskStore>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
    fail_open: bool,
}

impl CachedTaskStore {
    pub fn new(
        store: Arc<dyn TaskStore>,
        cache: Arc<dyn CacheStore>,
        ttl: Duration,
        fail_open: bool,
    ) -> Self {
        Self {
            store,
            cache,
            ttl,
            fail_open,
        }
    }

    /// The wrapped store
    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// The cache backend
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Lists every task, oldest first, through the cache
    pub async fn list(&self) -> Result<Vec<Task>, TaskCacheError> {
        match self.cache.get(TASKS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => {
                    debug!(count = tasks.len(), "Task list served from cache");
                    return Ok(tasks);
                }
                Err(e) => {
                    warn!(error = %e, "Discarding undecodable task list snapshot");
                }
            },
            Ok(None) => debug!("Task list cache miss"),
            Err(e) if self.fail_open => {
                warn!(error = %e, "Task cache read failed, serving from store");
                return Ok(self.store.list().await?);
            }
            Err(e) => return Err(TaskCacheError::Unavailable(e)),
        }

        let tasks = self.store.list().await?;
        self.populate(&tasks).await?;
        Ok(tasks)
    }

    async fn populate(&self, tasks: &[Task]) -> Result<(), TaskCacheError> {
        let raw = match serde_json::to_string(tasks) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to encode task list snapshot");
                return Ok(());
            }
        };

        match self.cache.set(TASKS_KEY, &raw, self.ttl).await {
            Ok(()) => {
                debug!(count = tasks.len(), ttl_secs = self.ttl.as_secs(), "Cached task list");
                Ok(())
            }
            Err(e) if self.fail_open => {
                warn!(error = %e, "Failed to cache task list");
                Ok(())
            }
            Err(e) => Err(TaskCacheError::Unavailable(e)),
        }
    }

    /// Finds one task; single-task reads bypass the cache
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, TaskCacheError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Creates a task and drops the snapshot
    pub async fn create(&self, data: CreateTask) -> Result<Task, TaskCacheError> {
        let task = self.store.create(data).await?;
        self.invalidate().await?;
        Ok(task)
    }

    /// Updates a task; the snapshot is dropped only if the task existed
    pub async fn update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, TaskCacheError> {
        let task = self.store.update(id, data).await?;
        if task.is_some() {
            self.invalidate().await?;
        }
        Ok(task)
    }

    /// Deletes a task; the snapshot is dropped only if a task was removed
    pub async fn delete(&self, id: Uuid) -> Result<bool, TaskCacheError> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            self.invalidate().await?;
        }
        Ok(deleted)
    }

    /// Drops the task list snapshot
    pub async fn invalidate(&self) -> Result<(), TaskCacheError> {
        self.cache
            .delete(TASKS_KEY)
            .await
            .map_err(TaskCacheError::Invalidation)?;
        debug!("Task list cache invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::store::memory::MemoryStore;

    const TTL: Duration = Duration::from_secs(30);

    fn setup(fail_open: bool) -> (Arc<MemoryStore>, Arc<MemoryCache>, CachedTaskStore) {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let tasks = CachedTaskStore::new(store.clone(), cache.clone(), TTL, fail_open);
        (store, cache, tasks)
    }

    fn milk() -> CreateTask {
        CreateTask {
            description: "buy milk".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_hits_store_once_within_ttl() {
        let (store, _cache, tasks) = setup(true);
        tasks.create(milk()).await.unwrap();

        let first = tasks.list().await.unwrap();
        let second = tasks.list().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_reloads_after_ttl() {
        let (store, _cache, tasks) = setup(true);
        tasks.create(milk()).await.unwrap();

        tasks.list().await.unwrap();
        tokio::time::advance(TTL).await;
        tasks.list().await.unwrap();

        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_mutations_invalidate() {
        let (store, cache, tasks) = setup(true);

        let task = tasks.create(milk()).await.unwrap();
        tasks.list().await.unwrap();
        assert!(cache.contains(TASKS_KEY).await);

        tasks
            .update(
                task.id,
                UpdateTask {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!cache.contains(TASKS_KEY).await);

        let listed = tasks.list().await.unwrap();
        assert!(listed[0].completed);

        assert!(tasks.delete(task.id).await.unwrap());
        assert!(tasks.list().await.unwrap().is_empty());
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_missing_row_does_not_invalidate() {
        let (_store, cache, tasks) = setup(true);
        tasks.create(milk()).await.unwrap();
        tasks.list().await.unwrap();

        let missing = Uuid::new_v4();
        assert!(tasks
            .update(missing, UpdateTask::default())
            .await
            .unwrap()
            .is_none());
        assert!(!tasks.delete(missing).await.unwrap());
        assert!(cache.contains(TASKS_KEY).await);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_a_miss() {
        let (store, cache, tasks) = setup(true);
        tasks.create(milk()).await.unwrap();
        cache.set(TASKS_KEY, "not json", TTL).await.unwrap();

        let listed = tasks.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(store.list_calls(), 1);

        // Repopulated with a valid snapshot
        tasks.list().await.unwrap();
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_fail_open_serves_from_store() {
        let (store, cache, tasks) = setup(true);
        TaskStore::create(store.as_ref(), milk()).await.unwrap();
        cache.set_unavailable(true);

        assert_eq!(tasks.list().await.unwrap().len(), 1);
        assert_eq!(tasks.list().await.unwrap().len(), 1);
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_fail_closed_surfaces_error() {
        let (_store, cache, tasks) = setup(false);
        cache.set_unavailable(true);

        assert!(matches!(
            tasks.list().await,
            Err(TaskCacheError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_invalidation_failure_is_an_error_but_write_persists() {
        let (store, cache, tasks) = setup(true);
        cache.set_unavailable(true);

        let result = tasks.create(milk()).await;
        assert!(matches!(result, Err(TaskCacheError::Invalidation(_))));
        assert_eq!(store.task_count().await, 1);
    }
}
