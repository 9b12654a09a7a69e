//! Process-local TTL cache shared by the legacy client.
//!
//! Values are type-erased and handed out as `Arc<T>`, so a cached mod list is
//! never cloned per request. Concurrent misses on the same key are coalesced:
//! the first caller fetches, the others wait on a per-key gate and then read
//! what it stored.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

type Gate = Arc<tokio::sync::Mutex<()>>;

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<String, Entry>>,
    inflight: Mutex<HashMap<String, Gate>>,
}

#[derive(Clone, Default)]
pub struct MemoryCache {
    inner: Arc<Inner>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live value under `key` if it holds a `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let mut entries = lock(&self.inner.entries);
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return entry.value.clone().downcast::<T>().ok();
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    pub fn insert<T: Any + Send + Sync>(&self, key: &str, value: T, ttl: Duration) -> Arc<T> {
        let value = Arc::new(value);
        self.insert_arc(key, value.clone(), ttl);
        value
    }

    pub fn insert_arc<T: Any + Send + Sync>(&self, key: &str, value: Arc<T>, ttl: Duration) {
        lock(&self.inner.entries).insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Inserts only when `key` has no live entry. Returns whether it inserted.
    pub fn try_insert<T: Any + Send + Sync>(&self, key: &str, value: T, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut entries = lock(&self.inner.entries);
        if entries.get(key).is_some_and(|e| e.expires_at > now) {
            return false;
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: Arc::new(value),
                expires_at: now + ttl,
            },
        );
        true
    }

    pub fn remove(&self, key: &str) -> bool {
        lock(&self.inner.entries).remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        lock(&self.inner.entries)
            .get(key)
            .map(|e| e.expires_at > Instant::now())
            .unwrap_or(false)
    }

    /// Drops expired entries, returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = lock(&self.inner.entries);
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get-or-populate with single flight per key.
    ///
    /// Only `Ok(Some(_))` results are stored; `None` and errors are returned
    /// to the caller and the next caller fetches again.
    pub async fn get_or_try_insert_with<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> anyhow::Result<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        if let Some(hit) = self.get::<T>(key) {
            return Ok(Some(hit));
        }

        let gate = {
            let mut inflight = lock(&self.inner.inflight);
            inflight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        let result = {
            let _guard = gate.lock().await;
            match self.get::<T>(key) {
                Some(hit) => Ok(Some(hit)),
                None => {
                    trace!(key, "cache miss, fetching");
                    match fetch().await {
                        Ok(Some(value)) => Ok(Some(self.insert(key, value, ttl))),
                        Ok(None) => Ok(None),
                        Err(e) => Err(e),
                    }
                }
            }
        };

        {
            let mut inflight = lock(&self.inner.inflight);
            // map + our clone; anyone else still waiting keeps the gate alive
            if inflight
                .get(key)
                .map(|g| Arc::ptr_eq(g, &gate) && Arc::strong_count(g) <= 2)
                .unwrap_or(false)
            {
                inflight.remove(key);
            }
        }

        result
    }
}
