use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

struct Entry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Bounded TTL cache keyed by `(operation, argument)`.
///
/// Capacity is enforced by LRU eviction; expiry is checked on read, so no
/// background task is needed. The TTL is a constructor parameter, not a
/// hidden module constant.
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<RwLock<LruCache<String, Entry>>>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries)
            .unwrap_or_else(|| NonZeroUsize::new(1024).expect("nonzero"));
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            ttl,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, operation: &str, argument: &str) -> Option<T> {
        let key = Self::key(operation, argument);
        let mut store = self.store.write().await;
        match store.get(&key) {
            Some(entry) if entry.is_expired() => {
                store.pop(&key);
                None
            }
            Some(entry) => serde_json::from_slice(&entry.data).ok(),
            None => None,
        }
    }

    pub async fn put<T: Serialize>(&self, operation: &str, argument: &str, value: &T) {
        let Ok(data) = serde_json::to_vec(value) else {
            return;
        };
        let entry = Entry {
            data,
            expires_at: Instant::now() + self.ttl,
        };
        let key = Self::key(operation, argument);
        debug!(%key, "cache store");
        self.store.write().await.put(key, entry);
    }

    fn key(operation: &str, argument: &str) -> String {
        format!("{operation}:{argument}")
    }
}
