//! Session resource cache.
//!
//! One entry per `ResourceKey`, each carrying the logical clock tick of its
//! last successful fetch and a stale flag. Stale entries stay readable through
//! [`ResourceCache::peek`] but [`ResourceCache::read`] refetches them.

use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use super::config::CacheConfig;
use super::invalidator::{InvalidationScope, StaleMarker};
use super::keys::ResourceKey;
use super::lock::{mutex_lock, rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "pharmadesk_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "pharmadesk_cache_miss_total";
pub(crate) const METRIC_CACHE_STALE_REFETCH: &str = "pharmadesk_cache_stale_refetch_total";

/// Logical clock value.
pub type Tick = u64;

type Payload = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    data: Payload,
    fetched_at: Tick,
    stale: bool,
}

/// Snapshot of a cached value as seen by [`ResourceCache::peek`].
#[derive(Debug)]
pub struct Cached<T> {
    pub data: Arc<T>,
    pub fetched_at: Tick,
    pub stale: bool,
}

enum Lookup<T> {
    Fresh(Arc<T>),
    Stale,
    Missing,
}

/// Keyed store of fetched API results with staleness tracking.
///
/// Constructed once per session and shared by reference (`Arc`) with every
/// reader and with the [`MutationInvalidator`](super::MutationInvalidator).
pub struct ResourceCache {
    config: CacheConfig,
    entries: RwLock<LruCache<ResourceKey, CacheEntry>>,
    clock: AtomicU64,
    // Latest tick at which each scope was invalidated. Reads that started
    // before that tick land stale.
    marks: Mutex<Vec<(InvalidationScope, Tick)>>,
}

impl ResourceCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            config: config.clone(),
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
            clock: AtomicU64::new(0),
            marks: Mutex::new(Vec::new()),
        }
    }

    /// Read `key`, fetching when it is missing or stale.
    ///
    /// A fresh entry is returned without calling `fetch`. Otherwise `fetch`
    /// runs, and on success its value replaces the entry with the stale flag
    /// cleared. A failed fetch leaves any existing entry untouched.
    pub async fn read<T, E, F, Fut>(&self, key: &ResourceKey, fetch: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.config.enabled {
            return fetch().await.map(Arc::new);
        }

        match self.lookup::<T>(key) {
            Lookup::Fresh(data) => {
                counter!(METRIC_CACHE_HIT, "family" => key.family().to_string()).increment(1);
                debug!(key = %key, "Cache hit");
                return Ok(data);
            }
            Lookup::Stale => {
                counter!(METRIC_CACHE_STALE_REFETCH, "family" => key.family().to_string())
                    .increment(1);
                debug!(key = %key, "Cache entry stale, refetching");
            }
            Lookup::Missing => {
                counter!(METRIC_CACHE_MISS, "family" => key.family().to_string()).increment(1);
                debug!(key = %key, "Cache miss");
            }
        }

        let started = self.now();
        let data = Arc::new(fetch().await?);
        self.put(key.clone(), Arc::clone(&data) as Payload, started);
        Ok(data)
    }

    /// Current entry for `key`, stale or not, without fetching.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &ResourceKey) -> Option<Cached<T>> {
        let entries = rw_read(&self.entries, SOURCE, "peek");
        let entry = entries.peek(key)?;
        let data = Arc::clone(&entry.data).downcast::<T>().ok()?;
        Some(Cached {
            data,
            fetched_at: entry.fetched_at,
            stale: entry.stale,
        })
    }

    /// Store a value fetched outside [`read`](Self::read), clearing staleness.
    pub fn insert<T: Send + Sync + 'static>(&self, key: ResourceKey, value: T) {
        let started = self.now();
        self.put(key, Arc::new(value), started);
    }

    /// Staleness of `key`, or `None` when nothing is cached for it.
    pub fn is_stale(&self, key: &ResourceKey) -> Option<bool> {
        rw_read(&self.entries, SOURCE, "is_stale")
            .peek(key)
            .map(|entry| entry.stale)
    }

    /// Keys currently cached, in most-recently-used order.
    pub fn keys(&self) -> Vec<ResourceKey> {
        rw_read(&self.entries, SOURCE, "keys")
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, e.g. when the session ends.
    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
        mutex_lock(&self.marks, SOURCE, "clear.marks").clear();
    }

    fn now(&self) -> Tick {
        self.clock.load(Ordering::SeqCst)
    }

    fn tick(&self) -> Tick {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn lookup<T: Send + Sync + 'static>(&self, key: &ResourceKey) -> Lookup<T> {
        let mut entries = rw_write(&self.entries, SOURCE, "lookup");
        let Some(entry) = entries.get(key) else {
            return Lookup::Missing;
        };
        if entry.stale {
            return Lookup::Stale;
        }
        match Arc::clone(&entry.data).downcast::<T>() {
            Ok(data) => Lookup::Fresh(data),
            // Same key read under a different type: treat as absent.
            Err(_) => Lookup::Missing,
        }
    }

    fn put(&self, key: ResourceKey, data: Payload, started: Tick) {
        let stale = self.invalidated_since(&key, started);
        let fetched_at = self.tick();
        if stale {
            debug!(key = %key, "Fetch overlapped an invalidation; stored as stale");
        }
        rw_write(&self.entries, SOURCE, "put").put(
            key,
            CacheEntry {
                data,
                fetched_at,
                stale,
            },
        );
    }

    fn invalidated_since(&self, key: &ResourceKey, started: Tick) -> bool {
        mutex_lock(&self.marks, SOURCE, "invalidated_since")
            .iter()
            .any(|(scope, at)| *at > started && scope.matches(key))
    }
}

impl StaleMarker for ResourceCache {
    fn mark_stale(&self, scope: &InvalidationScope) -> usize {
        let at = self.tick();
        {
            let mut marks = mutex_lock(&self.marks, SOURCE, "mark_stale.marks");
            match marks.iter_mut().find(|(existing, _)| existing == scope) {
                Some((_, tick)) => *tick = at,
                None => marks.push((scope.clone(), at)),
            }
        }

        let mut entries = rw_write(&self.entries, SOURCE, "mark_stale");
        let mut marked = 0;
        for (key, entry) in entries.iter_mut() {
            if scope.matches(key) {
                entry.stale = true;
                marked += 1;
            }
        }
        marked
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::cache::keys::family;

    fn medicines_page(page: u32) -> ResourceKey {
        ResourceKey::new(family::MEDICINES)
            .with_param("search", "")
            .with_param("page", page)
    }

    async fn counted_read(
        cache: &ResourceCache,
        key: &ResourceKey,
        calls: &AtomicUsize,
        value: &str,
    ) -> Arc<String> {
        cache
            .read(key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::convert::Infallible>(value.to_string())
            })
            .await
            .expect("infallible fetch")
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_fetching() {
        let cache = ResourceCache::new(&CacheConfig::default());
        let key = medicines_page(1);
        let calls = AtomicUsize::new(0);

        let first = counted_read(&cache, &key, &calls, "v1").await;
        let second = counted_read(&cache, &key, &calls, "v2").await;

        assert_eq!(*first, "v1");
        assert_eq!(*second, "v1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn stale_entry_stays_readable_until_refetched() {
        let cache = ResourceCache::new(&CacheConfig::default());
        let key = medicines_page(1);
        let calls = AtomicUsize::new(0);

        counted_read(&cache, &key, &calls, "before").await;
        let fetched_before = cache.peek::<String>(&key).expect("cached").fetched_at;

        assert_eq!(cache.mark_stale(&InvalidationScope::family("medicines")), 1);

        let shown = cache.peek::<String>(&key).expect("stale entries are kept");
        assert!(shown.stale);
        assert_eq!(*shown.data, "before");

        let refreshed = counted_read(&cache, &key, &calls, "after").await;
        assert_eq!(*refreshed, "after");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let entry = cache.peek::<String>(&key).expect("refreshed");
        assert!(!entry.stale);
        assert!(entry.fetched_at > fetched_before);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_refetch_keeps_stale_entry() {
        let cache = ResourceCache::new(&CacheConfig::default());
        let key = medicines_page(1);
        cache.insert(key.clone(), "old".to_string());
        cache.mark_stale(&InvalidationScope::family("medicines"));

        let result = cache
            .read::<String, _, _, _>(&key, || async { Err("offline") })
            .await;
        assert_eq!(result.unwrap_err(), "offline");
        assert_eq!(cache.is_stale(&key), Some(true));
    }

    #[tokio::test]
    async fn fetch_overlapping_invalidation_lands_stale() {
        let cache = Arc::new(ResourceCache::new(&CacheConfig::default()));
        let key = medicines_page(1);

        let inner = Arc::clone(&cache);
        let value = cache
            .read(&key, || async move {
                inner.mark_stale(&InvalidationScope::family("medicines"));
                Ok::<_, std::convert::Infallible>(7_u32)
            })
            .await
            .expect("infallible");

        assert_eq!(*value, 7);
        assert_eq!(cache.is_stale(&key), Some(true));
    }

    #[test]
    fn mark_stale_only_touches_matching_family() {
        let cache = ResourceCache::new(&CacheConfig::default());
        cache.insert(medicines_page(1), 1_u32);
        cache.insert(ResourceKey::new(family::MEDICINES_LOW_STOCK).with_param("search", ""), 2_u32);
        cache.insert(ResourceKey::new(family::SALES).with_param("page", 1), 3_u32);

        let marked = cache.mark_stale(&InvalidationScope::family("medicines"));

        assert_eq!(marked, 2);
        assert_eq!(cache.is_stale(&medicines_page(1)), Some(true));
        assert_eq!(
            cache.is_stale(&ResourceKey::new(family::SALES).with_param("page", 1)),
            Some(false)
        );
    }

    #[test]
    fn peek_with_wrong_type_is_none() {
        let cache = ResourceCache::new(&CacheConfig::default());
        cache.insert(medicines_page(1), 1_u32);
        assert!(cache.peek::<String>(&medicines_page(1)).is_none());
        assert!(cache.peek::<u32>(&medicines_page(1)).is_some());
    }

    #[tokio::test]
    async fn disabled_cache_always_fetches() {
        let cache = ResourceCache::new(&CacheConfig {
            enabled: false,
            ..Default::default()
        });
        let key = medicines_page(1);
        let calls = AtomicUsize::new(0);

        counted_read(&cache, &key, &calls, "a").await;
        counted_read(&cache, &key, &calls, "b").await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn lru_capacity_bounds_distinct_keys() {
        let cache = ResourceCache::new(&CacheConfig {
            capacity: 2,
            ..Default::default()
        });
        cache.insert(medicines_page(1), 1_u32);
        cache.insert(medicines_page(2), 2_u32);
        cache.insert(medicines_page(3), 3_u32);

        assert_eq!(cache.len(), 2);
        assert!(cache.is_stale(&medicines_page(1)).is_none());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let cache = ResourceCache::new(&CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache
                .entries
                .write()
                .expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        cache.insert(medicines_page(1), 1_u32);
        assert_eq!(cache.len(), 1);
    }
}
