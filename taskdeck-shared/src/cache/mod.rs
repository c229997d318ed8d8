//! Key-value cache with expiry
//!
//! Only one key is ever written: `"tasks"`, a JSON snapshot of the full task
//! list, maintained by [`CachedTaskStore`].
//!
//! - `redis`: production backend over a Redis `ConnectionManager`
//! - `memory`: in-process backend driven by the tokio clock
//! - `task_list`: cache-aside reads and invalidate-on-write for tasks

pub mod memory;
pub mod redis;
pub mod task_list;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryCache;
pub use self::redis::{RedisCache, RedisConfig};
pub use task_list::{CachedTaskStore, TaskCacheError, TASKS_KEY};

/// Cache backend errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend unreachable
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// Command rejected or failed
    #[error("Cache command error: {0}")]
    Command(String),

    /// Command did not complete in time
    #[error("Cache command timed out")]
    Timeout,

    /// Invalid cache configuration
    #[error("Cache configuration error: {0}")]
    Config(String),
}

/// String-valued cache with per-key expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value under `key`, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, expiring after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`; absent keys are not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Checks the backend responds
    async fn ping(&self) -> Result<(), CacheError>;
}
