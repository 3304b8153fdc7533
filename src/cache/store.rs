//! In-memory asset store with lazy TTL expiry.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use lru::LruCache;
use parking_lot::Mutex;

use crate::cache::clock::{Clock, SystemClock};
use crate::observability::metrics;

/// A previously fetched asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Bytes,
    pub content_type: Option<String>,
    pub inserted_at: Instant,
}

/// Storage seam for the asset handler.
pub trait AssetStore: Send + Sync + fmt::Debug {
    /// Look up a live entry. Expired entries are removed and reported missing.
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Insert or replace the entry for `key`, stamped with the current time.
    fn put(&self, key: &str, payload: Bytes, content_type: Option<String>);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Thread-safe TTL cache, optionally bounded with least-recently-used eviction.
pub struct AssetCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl AssetCache {
    /// `capacity == 0` means unbounded.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let entries = match NonZeroUsize::new(capacity) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self {
            entries: Mutex::new(entries),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCache")
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish()
    }
}

impl AssetStore for AssetCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let expired = match entries.peek(key) {
            Some(entry) => now.saturating_duration_since(entry.inserted_at) > self.ttl,
            None => return None,
        };

        if expired {
            entries.pop(key);
            metrics::record_cache_size(entries.len());
            tracing::debug!(key = %key, "Cache entry expired");
            return None;
        }

        entries.get(key).cloned()
    }

    fn put(&self, key: &str, payload: Bytes, content_type: Option<String>) {
        let entry = CacheEntry {
            key: key.to_string(),
            payload,
            content_type,
            inserted_at: self.clock.now(),
        };

        let mut entries = self.entries.lock();
        if let Some((evicted, _)) = entries.push(key.to_string(), entry) {
            if evicted != key {
                tracing::debug!(key = %evicted, "Cache entry evicted");
            }
        }
        metrics::record_cache_size(entries.len());
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn cache(capacity: usize) -> (AssetCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = AssetCache::with_clock(30 * DAY, capacity, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_cache_operations() {
        let (cache, _) = cache(0);

        assert!(cache.get("/e/1/foo.png").is_none());

        cache.put("/e/1/foo.png", Bytes::from_static(b"png"), Some("image/png".into()));
        let entry = cache.get("/e/1/foo.png").unwrap();
        assert_eq!(entry.key, "/e/1/foo.png");
        assert_eq!(entry.payload, Bytes::from_static(b"png"));
        assert_eq!(entry.content_type.as_deref(), Some("image/png"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_overwrites_and_restamps() {
        let (cache, clock) = cache(0);

        cache.put("k", Bytes::from_static(b"old"), None);
        clock.advance(20 * DAY);
        cache.put("k", Bytes::from_static(b"new"), Some("text/plain".into()));
        clock.advance(20 * DAY);

        // 40 days after the first write, 20 after the second.
        let entry = cache.get("k").unwrap();
        assert_eq!(entry.payload, Bytes::from_static(b"new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_boundary() {
        let (cache, clock) = cache(0);
        cache.put("k", Bytes::from_static(b"v"), None);

        clock.advance(30 * DAY);
        assert!(cache.get("k").is_some(), "entry exactly at TTL is still valid");

        clock.advance(Duration::from_millis(1));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty(), "expired entry removed on read");
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let (cache, _) = cache(2);
        cache.put("a", Bytes::from_static(b"a"), None);
        cache.put("b", Bytes::from_static(b"b"), None);

        // Touch "a" so "b" becomes the eviction candidate.
        assert!(cache.get("a").is_some());
        cache.put("c", Bytes::from_static(b"c"), None);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(AssetCache::new(DAY, 0));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        let key = format!("/e/1/{}", j % 10);
                        cache.put(&key, Bytes::from(format!("{}", i)), None);
                        assert!(cache.get(&key).is_some());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 10);
    }
}
