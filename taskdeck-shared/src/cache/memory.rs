//! In-process cache
//!
//! Expiry uses `tokio::time::Instant`, so tests can move past a TTL with
//! `tokio::time::pause` / `advance` instead of sleeping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{CacheError, CacheStore};

/// Cache held in a map
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    unavailable: AtomicBool,
}

impl MemoryCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with a connection error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Whether `key` holds a live entry
    pub async fn contains(&self, key: &str) -> bool {
        let entries = self.entries.lock().await;
        matches!(entries.get(key), Some((_, expires)) if *expires > Instant::now())
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CacheError::Connection("cache unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_available()?;

        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.check_available()?;

        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check_available()?;

        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.check_available()
    }
}
