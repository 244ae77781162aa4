use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use feed_logging::feed_debug;
use scrollfeed_core::{FetchResult, LoadError};

use crate::ContentProvider;

/// Default freshness window for cached pages.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub page: u32,
    pub page_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit rate in percent; 0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.hits as f64 / self.total() as f64 * 100.0
        }
    }
}

struct CachedPage {
    result: FetchResult,
    stored_at: Instant,
}

/// Successful pages of one list, kept for a bounded time.
///
/// A cache belongs to one list view and lives as long as it does.
pub struct PageCache {
    ttl: Duration,
    pages: HashMap<CacheKey, CachedPage>,
    stats: CacheStats,
    /// Bumped by every invalidation.
    generation: u64,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pages: HashMap::new(),
            stats: CacheStats::default(),
            generation: 0,
        }
    }

    pub fn get(&mut self, key: CacheKey) -> Option<FetchResult> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&mut self, key: CacheKey, now: Instant) -> Option<FetchResult> {
        let fresh = self
            .pages
            .get(&key)
            .filter(|cached| now.saturating_duration_since(cached.stored_at) < self.ttl)
            .map(|cached| cached.result.clone());
        match fresh {
            Some(result) => {
                self.stats.hits += 1;
                Some(result)
            }
            None => {
                self.pages.remove(&key);
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: CacheKey, result: FetchResult) {
        self.insert_at(key, result, Instant::now());
    }

    pub fn insert_at(&mut self, key: CacheKey, result: FetchResult, now: Instant) {
        self.pages.insert(
            key,
            CachedPage {
                result,
                stored_at: now,
            },
        );
    }

    /// Stores `result` only if no invalidation happened since `generation`
    /// was read. Returns whether it was stored.
    pub fn insert_if_current(
        &mut self,
        generation: u64,
        key: CacheKey,
        result: FetchResult,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        self.insert(key, result);
        true
    }

    pub fn invalidate_all(&mut self) {
        self.pages.clear();
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

/// Serves repeated page requests from a [`PageCache`] before asking `inner`.
pub struct CachingProvider<P> {
    inner: P,
    cache: Mutex<PageCache>,
}

impl<P: ContentProvider> CachingProvider<P> {
    pub fn new(inner: P, cache: PageCache) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache
            .lock()
            .map(|cache| cache.stats())
            .unwrap_or_default()
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<P: ContentProvider> ContentProvider for CachingProvider<P> {
    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<FetchResult, LoadError> {
        let key = CacheKey { page, page_size };
        let (cached, generation) = match self.cache.lock() {
            Ok(mut cache) => (cache.get(key), Some(cache.generation())),
            Err(_) => (None, None),
        };
        if let Some(result) = cached {
            feed_debug!("page cache hit page={} page_size={}", page, page_size);
            return Ok(FetchResult {
                from_cache: true,
                ..result
            });
        }

        let result = self.inner.fetch_page(page, page_size).await?;
        if let (true, Some(generation)) = (result.success, generation) {
            if let Ok(mut cache) = self.cache.lock() {
                // A page requested before an invalidation belongs to the old session.
                if !cache.insert_if_current(generation, key, result.clone()) {
                    feed_debug!("dropping page {} fetched before invalidation", page);
                }
            }
        }
        Ok(result)
    }

    fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.invalidate_all();
        }
        self.inner.invalidate();
    }
}
