//! In-memory cache of finished analyses, keyed by normalized query.

use crate::analysis::models::AnalyticsResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

pub const DEFAULT_CAPACITY: usize = 32;
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    value: AnalyticsResult,
    expires_at: Instant,
}

/// Bounded LRU of analysis results with per-entry expiry.
pub struct ResultCache {
    inner: RwLock<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or_else(|| {
            tracing::warn!("Cache capacity was 0, defaulting to {}", DEFAULT_CAPACITY);
            NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN)
        });
        Self { inner: RwLock::new(LruCache::new(cap)), ttl }
    }

    /// Cache key: trimmed, lowercased, whitespace collapsed.
    pub fn key(query: &str) -> String {
        query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }

    pub fn get(&self, query: &str) -> Option<AnalyticsResult> {
        let key = Self::key(query);
        let mut cache = self.inner.write().map_or_else(
            |_| {
                tracing::error!("Cache lock poisoned on get('{key}'), returning miss");
                None
            },
            Some,
        )?;
        let entry = cache.get(&key)?;
        if Instant::now() > entry.expires_at {
            cache.pop(&key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, query: &str, value: AnalyticsResult) {
        let key = Self::key(query);
        if let Ok(mut cache) = self.inner.write() {
            cache.put(key, CacheEntry { value, expires_at: Instant::now() + self.ttl });
        } else {
            tracing::error!("Cache lock poisoned on put('{key}'), skipping write");
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
