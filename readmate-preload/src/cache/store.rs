//! Bounded chapter cache with LRU eviction and age-based expiry

use crate::cache::{
    entry::CacheEntry,
    types::{ChapterKey, PreloadStats},
};
use crate::fetcher::ChapterContent;
use chrono::{DateTime, Utc};
use lru::LruCache;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Entries older than this are dropped by [`PreloadCache::clean_expired`]
pub const CACHE_ENTRY_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Chapter cache keyed by (book, chapter index)
///
/// - Holds at most `max_size` entries; inserting into a full cache evicts the
///   least recently used chapter first
/// - Reads refresh recency, existence checks do not
/// - Entries expire one hour after insertion, swept by `clean_expired`
///
/// None of the operations fail. The cache is not synchronised; the preload
/// manager owns it behind its state lock.
#[derive(Debug)]
pub struct PreloadCache {
    entries: HashMap<ChapterKey, CacheEntry>,
    /// Recency order only; capacity is enforced against `entries`
    recency: LruCache<ChapterKey, ()>,
    max_size: usize,
    stats: PreloadStats,
}

impl PreloadCache {
    /// Create an empty cache holding at most `max_size` chapters
    pub fn new(max_size: usize) -> Self {
        debug!("Initializing preload cache (max_size: {})", max_size);

        Self {
            entries: HashMap::new(),
            recency: LruCache::unbounded(),
            max_size,
            stats: PreloadStats::default(),
        }
    }

    /// Insert or overwrite a chapter
    ///
    /// Every call counts towards `preload_success`, including writes from the
    /// direct read path, so that counter measures chapters cached rather than
    /// speculative fetches that succeeded.
    pub fn set(&mut self, book_id: &str, chapter_index: usize, content: ChapterContent) {
        self.set_at(book_id, chapter_index, content, Utc::now());
    }

    /// [`set`](Self::set) with an explicit insertion time
    pub fn set_at(
        &mut self,
        book_id: &str,
        chapter_index: usize,
        content: ChapterContent,
        now: DateTime<Utc>,
    ) {
        let key = ChapterKey::new(book_id, chapter_index);

        while self.entries.len() >= self.max_size {
            if !self.evict_lru() {
                break;
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(content, now));
        self.recency.put(key.clone(), ());
        self.stats.current_cache_size = self.entries.len();
        self.stats.preload_success += 1;

        debug!("Cached chapter {}", key);
    }

    /// Read a chapter, refreshing its recency on a hit
    pub fn get(&mut self, book_id: &str, chapter_index: usize) -> Option<ChapterContent> {
        let key = ChapterKey::new(book_id, chapter_index);

        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.mark_accessed(Utc::now());
                let content = entry.content.clone();
                self.recency.promote(&key);
                self.stats.cache_hits += 1;

                debug!("Cache hit: {}", key);
                Some(content)
            }
            None => {
                self.stats.cache_misses += 1;
                debug!("Cache miss: {}", key);
                None
            }
        }
    }

    /// Check whether a chapter is cached, without touching recency or stats
    pub fn has(&self, book_id: &str, chapter_index: usize) -> bool {
        self.entries
            .contains_key(&ChapterKey::new(book_id, chapter_index))
    }

    /// Remove a chapter; returns whether anything was removed
    pub fn delete(&mut self, book_id: &str, chapter_index: usize) -> bool {
        let key = ChapterKey::new(book_id, chapter_index);

        if self.entries.remove(&key).is_some() {
            self.recency.pop(&key);
            self.stats.current_cache_size = self.entries.len();
            debug!("Removed cache entry: {}", key);
            true
        } else {
            false
        }
    }

    /// Drop every entry; counters other than the size are kept
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.recency.clear();
        self.stats.current_cache_size = 0;

        info!("Cleared {} entries from preload cache", count);
    }

    /// Remove entries inserted more than an hour ago
    pub fn clean_expired(&mut self) -> usize {
        self.clean_expired_at(Utc::now())
    }

    /// [`clean_expired`](Self::clean_expired) relative to an explicit time;
    /// returns the number of entries removed
    pub fn clean_expired_at(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<ChapterKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now, CACHE_ENTRY_MAX_AGE))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.recency.pop(key);
        }

        if !expired.is_empty() {
            self.stats.current_cache_size = self.entries.len();
            debug!("Cleaned up {} expired entries", expired.len());
        }

        expired.len()
    }

    /// Change the capacity, evicting least recently used entries to fit
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;

        while self.entries.len() > self.max_size {
            if !self.evict_lru() {
                break;
            }
        }

        self.stats.current_cache_size = self.entries.len();
        info!("Updated preload cache max size: {}", max_size);
    }

    /// Snapshot of the statistics
    pub fn stats(&self) -> PreloadStats {
        self.stats.clone()
    }

    /// Hit rate as a percentage, 0 when nothing was read yet
    pub fn hit_rate(&self) -> f64 {
        self.stats.hit_rate()
    }

    /// Count a failed speculative fetch
    pub fn record_preload_failure(&mut self) {
        self.stats.preload_failures += 1;
    }

    /// Current capacity
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of cached chapters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached keys from least to most recently used
    pub fn keys_by_recency(&self) -> Vec<ChapterKey> {
        self.recency
            .iter()
            .rev()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Evict the least recently used entry; false when nothing is left to evict
    fn evict_lru(&mut self) -> bool {
        match self.recency.pop_lru() {
            Some((key, ())) => {
                self.entries.remove(&key);
                debug!("Evicted least recently used entry: {}", key);
                true
            }
            None => false,
        }
    }
}
