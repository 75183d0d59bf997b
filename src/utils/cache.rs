//! In-Memory TTL Cache
//!
//! Thread-safe cache untuk hasil lookup eksternal (pencarian nutrisi).
//! Menggunakan DashMap untuk concurrent access tanpa lock contention.
//!
//! - TTL-based expiration
//! - Key normalization (trim + lowercase)
//! - HIT/MISS counters for /health

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;


/// Cache entry dengan timestamp untuk TTL validation
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// TTL cache keyed by normalized strings
#[derive(Clone)]
pub struct TtlCache<V: Clone> {
    store: Arc<DashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl<V: Clone> TtlCache<V> {
    /// Buat cache dengan TTL dalam detik
    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl: Duration::from_secs(ttl_secs),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn normalize_key(key: &str) -> String {
        key.trim().to_lowercase()
    }

    /// Returns the cached value if present and not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let key = Self::normalize_key(key);

        // The read guard must be released before remove() or DashMap deadlocks
        let lookup = self
            .store
            .get(&key)
            .map(|entry| (!entry.is_expired(self.ttl)).then(|| entry.value.clone()));

        let hit = match lookup {
            Some(Some(value)) => Some(value),
            Some(None) => {
                self.store.remove(&key);
                None
            }
            None => None,
        };

        match hit {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("✅ CACHE HIT: {}", key);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS: {}", key);
                None
            }
        }
    }

    /// Simpan value; only successful lookups should be stored
    pub fn set(&self, key: &str, value: V) {
        let key = Self::normalize_key(key);
        self.store.insert(
            key.clone(),
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
        debug!("💾 CACHE SET: {} (TTL: {}s)", key, self.ttl.as_secs());
    }

    /// Bersihkan semua entry yang expired
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        let ttl = self.ttl;
        self.store.retain(|_, entry| !entry.is_expired(ttl));
        before.saturating_sub(self.store.len())
    }

    /// Get statistik cache
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

/// Statistik cache untuk monitoring
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_set_get() {
        let cache: TtlCache<Vec<u32>> = TtlCache::with_ttl(60);
        cache.set("ayam", vec![1, 2]);
        assert_eq!(cache.get("ayam"), Some(vec![1, 2]));
    }

    #[test]
    fn test_key_normalization() {
        let cache: TtlCache<u32> = TtlCache::with_ttl(60);
        cache.set("  Nasi Putih ", 1);
        assert_eq!(cache.get("nasi putih"), Some(1));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache: TtlCache<u32> = TtlCache::with_ttl(0);
        cache.set("tempe", 1);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("tempe"), None);
        assert_eq!(cache.cleanup_expired(), 0);
    }

    #[test]
    fn test_cache_stats() {
        let cache: TtlCache<u32> = TtlCache::with_ttl(60);
        cache.set("bayam", 1);
        cache.get("bayam");
        cache.get("telur");

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 50.0);
    }

    #[test]
    fn test_cleanup_during_concurrent_inserts() {
        let cache: TtlCache<u32> = TtlCache::with_ttl(60);
        let writer = cache.clone();

        std::thread::scope(|scope| {
            scope.spawn(move || {
                for i in 0..2000 {
                    writer.set(&format!("produk-{}", i), i);
                }
            });
            for _ in 0..200 {
                assert_eq!(cache.cleanup_expired(), 0);
            }
        });

        assert_eq!(cache.stats().entries, 2000);
    }
}
