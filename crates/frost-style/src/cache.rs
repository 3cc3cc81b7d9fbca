#![forbid(unsafe_code)]

//! Bounded cache of built dialog backgrounds.
//!
//! Building a [`LayeredDrawable`] is cheap but dialogs are restyled on every
//! show, so identical fingerprints share one `Arc`. The cache is
//! mutex-guarded and can be shared between dialogs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::drawable::{Background, LayeredDrawable};
use crate::fingerprint::StyleFingerprint;
use crate::lru::ArenaLru;

/// Default number of resident drawables.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Statistics about cache performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Current number of entries.
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate hit rate (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Inner {
    lru: ArenaLru<StyleFingerprint, Arc<LayeredDrawable>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Inner {
    fn insert(&mut self, fp: StyleFingerprint, drawable: Arc<LayeredDrawable>) {
        if let Some((evicted, _)) = self.lru.put(fp, drawable) {
            self.evictions += 1;
            tracing::debug!(fp = ?evicted, "background cache eviction");
        }
    }
}

/// Strict LRU from [`StyleFingerprint`] to a shared [`LayeredDrawable`].
#[derive(Debug)]
pub struct BackgroundDrawableCache {
    inner: Mutex<Inner>,
}

impl Default for BackgroundDrawableCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl BackgroundDrawableCache {
    /// Create a cache holding at most `capacity` drawables (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                lru: ArenaLru::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    // Every mutation completes before the guard drops; poison carries no state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached drawable for `fp`, promoting it to most recently used.
    pub fn get(&self, fp: &StyleFingerprint) -> Option<Arc<LayeredDrawable>> {
        let mut inner = self.lock();
        let found = inner.lru.get(fp).cloned();
        match found {
            Some(drawable) => {
                inner.hits += 1;
                tracing::trace!(?fp, "background cache hit");
                Some(drawable)
            }
            None => {
                inner.misses += 1;
                tracing::trace!(?fp, "background cache miss");
                None
            }
        }
    }

    /// Insert as most recently used, evicting the least recent entry when full.
    pub fn put(&self, fp: StyleFingerprint, drawable: Arc<LayeredDrawable>) {
        self.lock().insert(fp, drawable);
    }

    /// Background for `fp`, building and caching a layered drawable on miss.
    ///
    /// A custom drawable id short-circuits to [`Background::Resource`] and
    /// touches neither the cache nor its statistics.
    ///
    /// Lookup and insertion happen under one lock, so concurrent callers
    /// resolving the same new fingerprint share a single drawable.
    pub fn resolve(&self, fp: &StyleFingerprint) -> Background {
        if let Some(id) = fp.custom_drawable_id {
            return Background::Resource(id);
        }
        let mut inner = self.lock();
        let found = inner.lru.get(fp).cloned();
        if let Some(drawable) = found {
            inner.hits += 1;
            tracing::trace!(?fp, "background cache hit");
            return Background::Layered(drawable);
        }
        inner.misses += 1;
        let drawable = Arc::new(LayeredDrawable::from_fingerprint(fp));
        inner.insert(*fp, Arc::clone(&drawable));
        Background::Layered(drawable)
    }

    /// Presence check that does not touch recency or statistics.
    #[must_use]
    pub fn contains(&self, fp: &StyleFingerprint) -> bool {
        self.lock().lru.contains(fp)
    }

    pub fn len(&self) -> usize {
        self.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().lru.is_empty()
    }

    /// Fingerprints from most to least recently used.
    pub fn fingerprints_by_recency(&self) -> Vec<StyleFingerprint> {
        self.lock().lru.keys_by_recency()
    }

    pub fn clear(&self) {
        self.lock().lru.clear();
    }

    pub fn reset_stats(&self) {
        let mut inner = self.lock();
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            size: inner.lru.len(),
            capacity: inner.lru.capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::CornerRadii;
    use frost_core::Argb;

    fn fp(i: u32) -> StyleFingerprint {
        StyleFingerprint::new(CornerRadii::uniform(i as f32), Argb::WHITE)
    }

    #[test]
    fn eleventh_fingerprint_evicts_oldest() {
        let cache = BackgroundDrawableCache::with_default_capacity();
        for i in 0..11 {
            cache.resolve(&fp(i));
        }
        assert_eq!(cache.len(), 10);
        assert!(!cache.contains(&fp(0)));
        assert!((1..11).all(|i| cache.contains(&fp(i))));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn get_promotes_before_eviction() {
        let cache = BackgroundDrawableCache::with_default_capacity();
        for i in 0..10 {
            cache.resolve(&fp(i));
        }
        assert!(cache.get(&fp(0)).is_some());
        cache.resolve(&fp(10));
        assert!(cache.contains(&fp(0)));
        assert!(!cache.contains(&fp(1)));
    }

    #[test]
    fn identical_fingerprints_share_allocation() {
        let cache = BackgroundDrawableCache::new(4);
        let a = cache.resolve(&fp(3));
        let b = cache.resolve(&fp(3));
        let (Some(a), Some(b)) = (a.as_layered(), b.as_layered()) else {
            panic!("expected layered backgrounds");
        };
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                evictions: 0,
                size: 1,
                capacity: 4,
            }
        );
    }

    #[test]
    fn custom_drawable_bypasses_cache() {
        let cache = BackgroundDrawableCache::new(4);
        let bg = cache.resolve(&fp(1).with_custom_drawable(77));
        assert_eq!(bg, Background::Resource(77));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn concurrent_first_resolves_share_one_drawable() {
        use std::sync::Barrier;

        let cache = Arc::new(BackgroundDrawableCache::new(4));
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    cache.resolve(&fp(42))
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let first = results[0].as_layered().unwrap();
        for bg in &results {
            assert!(Arc::ptr_eq(first, bg.as_layered().unwrap()));
        }
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (7, 1, 1));
    }

    #[test]
    fn hit_rate() {
        let cache = BackgroundDrawableCache::new(2);
        assert_eq!(cache.stats().hit_rate(), 0.0);
        cache.resolve(&fp(1));
        cache.resolve(&fp(1));
        cache.resolve(&fp(1));
        cache.resolve(&fp(1));
        assert!((cache.stats().hit_rate() - 0.75).abs() < f64::EPSILON);
        cache.reset_stats();
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().size, 1);
    }

    #[test]
    #[tracing_test::traced_test]
    fn eviction_is_logged() {
        let cache = BackgroundDrawableCache::new(1);
        cache.resolve(&fp(1));
        cache.resolve(&fp(2));
        assert!(logs_contain("background cache eviction"));
    }
}
