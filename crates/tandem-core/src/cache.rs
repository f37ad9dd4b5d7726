//! Bounded LRU cache of directory listings with per-entry TTL.
//!
//! The cache is owned by the event-loop task; background workers hand back
//! fresh listings and never touch it. Time is passed in explicitly so the
//! clock can be substituted in tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::entry::DirListing;

/// Cache key: canonical directory path plus the show-hidden flag the
/// listing was produced under.
pub type CacheKey = (PathBuf, bool);

struct Slot {
    listing: Arc<DirListing>,
    inserted: Instant,
}

/// LRU + TTL store for directory listings.
pub struct DirCache {
    slots: HashMap<CacheKey, Slot>,
    // Most recently used at the back.
    order: Vec<CacheKey>,
    max_entries: usize,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

impl DirCache {
    /// Create a cache with the given capacity and time-to-live.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            slots: HashMap::new(),
            order: Vec::new(),
            max_entries: max_entries.max(1),
            ttl,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a listing. Entries older than the TTL are dropped and count
    /// as a miss.
    pub fn get(&mut self, key: &CacheKey, now: Instant) -> Option<Arc<DirListing>> {
        let fresh = match self.slots.get(key) {
            Some(slot) => now.duration_since(slot.inserted) <= self.ttl,
            None => {
                self.misses += 1;
                return None;
            }
        };

        if !fresh {
            self.remove(key);
            self.misses += 1;
            return None;
        }

        self.touch(key);
        self.hits += 1;
        self.slots.get(key).map(|slot| Arc::clone(&slot.listing))
    }

    /// Insert a listing, evicting the least recently used entry at capacity.
    pub fn put(&mut self, key: CacheKey, listing: Arc<DirListing>, now: Instant) {
        if self.slots.contains_key(&key) {
            self.order.retain(|k| k != &key);
        } else if self.slots.len() >= self.max_entries {
            let lru = self.order.remove(0);
            debug!(path = %lru.0.display(), "evicting LRU listing");
            self.slots.remove(&lru);
        }

        self.slots.insert(
            key.clone(),
            Slot {
                listing,
                inserted: now,
            },
        );
        self.order.push(key);
    }

    /// Remove every entry whose directory is `path` or lies below it.
    ///
    /// Called after each mutating operation, before any panel refresh.
    pub fn invalidate(&mut self, path: &Path) {
        let stale: Vec<CacheKey> = self
            .slots
            .keys()
            .filter(|(dir, _)| dir == path || dir.starts_with(path))
            .cloned()
            .collect();
        for key in &stale {
            self.remove(key);
        }
        if !stale.is_empty() {
            debug!(path = %path.display(), count = stale.len(), "invalidated listings");
        }
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// (hits, misses) counters for the log.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let key = self.order.remove(pos);
            self.order.push(key);
        }
    }

    fn remove(&mut self, key: &CacheKey) {
        self.slots.remove(key);
        self.order.retain(|k| k != key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortSpec;

    fn listing(path: &str) -> Arc<DirListing> {
        Arc::new(DirListing::new(
            PathBuf::from(path),
            Vec::new(),
            SortSpec::default(),
            0,
        ))
    }

    fn key(path: &str) -> CacheKey {
        (PathBuf::from(path), false)
    }

    #[test]
    fn test_put_get_within_ttl() {
        let mut cache = DirCache::new(10, Duration::from_secs(60));
        let now = Instant::now();
        cache.put(key("/a"), listing("/a"), now);
        assert!(cache.get(&key("/a"), now).is_some());
        assert!(cache
            .get(&key("/a"), now + Duration::from_secs(59))
            .is_some());
    }

    #[test]
    fn test_expired_entry_is_miss() {
        let mut cache = DirCache::new(10, Duration::from_secs(60));
        let now = Instant::now();
        cache.put(key("/a"), listing("/a"), now);
        assert!(cache
            .get(&key("/a"), now + Duration::from_secs(61))
            .is_none());
        // The expired slot is gone, not resurrected later.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_show_hidden_is_part_of_key() {
        let mut cache = DirCache::new(10, Duration::from_secs(60));
        let now = Instant::now();
        cache.put((PathBuf::from("/a"), true), listing("/a"), now);
        assert!(cache.get(&key("/a"), now).is_none());
        assert!(cache.get(&(PathBuf::from("/a"), true), now).is_some());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = DirCache::new(2, Duration::from_secs(60));
        let now = Instant::now();
        cache.put(key("/a"), listing("/a"), now);
        cache.put(key("/b"), listing("/b"), now);
        // Touch /a so /b becomes the LRU.
        cache.get(&key("/a"), now);
        cache.put(key("/c"), listing("/c"), now);

        assert!(cache.get(&key("/a"), now).is_some());
        assert!(cache.get(&key("/b"), now).is_none());
        assert!(cache.get(&key("/c"), now).is_some());
    }

    #[test]
    fn test_invalidate_subtree() {
        let mut cache = DirCache::new(10, Duration::from_secs(60));
        let now = Instant::now();
        cache.put(key("/a"), listing("/a"), now);
        cache.put(key("/a/sub"), listing("/a/sub"), now);
        cache.put(key("/ab"), listing("/ab"), now);

        cache.invalidate(Path::new("/a"));

        assert!(cache.get(&key("/a"), now).is_none());
        assert!(cache.get(&key("/a/sub"), now).is_none());
        // `/ab` is a sibling, not a subdirectory.
        assert!(cache.get(&key("/ab"), now).is_some());
    }

    #[test]
    fn test_reinsert_refreshes_age() {
        let mut cache = DirCache::new(10, Duration::from_secs(60));
        let now = Instant::now();
        cache.put(key("/a"), listing("/a"), now);
        cache.put(key("/a"), listing("/a"), now + Duration::from_secs(50));
        assert!(cache
            .get(&key("/a"), now + Duration::from_secs(100))
            .is_some());
        assert_eq!(cache.len(), 1);
    }
}
