//! In-memory TTL cache for provider results
//!
//! Each key owns exactly one slot holding the last successful fetch and the
//! instant it was taken. A slot is served only while it is younger than the
//! caller-supplied TTL; after that the producer is invoked again.
//!
//! # Example
//!
//! ```rust,ignore
//! use pulsecast::cache::TtlCache;
//! use std::time::Duration;
//!
//! let cache: TtlCache<u64> = TtlCache::new();
//! let value = cache
//!     .get("prices", Duration::from_secs(60), || async { Ok::<_, FetchError>(65_000) })
//!     .await?;
//! ```
//!
//! Failed producers never touch the slot, and the lock is released before the
//! producer runs, so a slow or failing refresh never blocks other callers.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A cached value and the instant it was fetched
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The cached value
    pub value: T,
    /// When the value was fetched
    pub fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    /// Create an entry stamped with the current instant
    pub fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    /// Check whether the entry is still fresh for the given TTL
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Time-bounded memoization of fetch results, keyed by name
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the fresh value for `key`, or run `producer` and store its result
    ///
    /// On producer failure the error is returned and the slot is left as it
    /// was, so the next caller retries.
    pub async fn get<E, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.peek(key, ttl).await {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        tracing::debug!(key = %key, "Cache miss");

        let value = producer().await?;

        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry::new(value.clone()));

        Ok(value)
    }

    /// Return the value for `key` if it is still fresh, without refreshing
    pub async fn peek(&self, key: &str, ttl: Duration) -> Option<T> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| entry.value.clone())
    }

    /// Drop the slot for `key`
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drop every slot
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of slots currently held (fresh or not)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the cache holds no slots
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
