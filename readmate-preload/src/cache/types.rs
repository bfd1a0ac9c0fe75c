//! Core type definitions for the chapter cache

use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key addressing one chapter of one book
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterKey {
    /// Book identifier (the reader server uses the book URL)
    pub book_id: String,

    /// Zero-based chapter index
    pub chapter_index: usize,
}

impl ChapterKey {
    pub fn new(book_id: impl Into<String>, chapter_index: usize) -> Self {
        Self {
            book_id: book_id.into(),
            chapter_index,
        }
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.book_id, self.chapter_index)
    }
}

/// Counters describing cache and preload effectiveness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PreloadStats {
    /// Reads served from the cache
    pub cache_hits: u64,

    /// Reads that found nothing cached
    pub cache_misses: u64,

    /// Cache writes (see [`crate::cache::PreloadCache::set`])
    pub preload_success: u64,

    /// Failed speculative fetch attempts
    pub preload_failures: u64,

    /// Number of chapters currently cached
    pub current_cache_size: usize,
}

impl PreloadStats {
    /// Cache hit rate as a percentage, 0 when nothing was read yet
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for PreloadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PreloadStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, cached: {}, success: {}, failures: {} }}",
            self.cache_hits,
            self.cache_misses,
            self.hit_rate(),
            self.current_cache_size,
            self.preload_success,
            self.preload_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = PreloadStats {
            cache_hits: 3,
            cache_misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 75.0);
    }

    #[test]
    fn test_hit_rate_zero_requests() {
        assert_eq!(PreloadStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_key_display_and_equality() {
        let key = ChapterKey::new("https://books.example/b/1", 4);
        assert_eq!(key.to_string(), "https://books.example/b/1#4");
        assert_eq!(key, ChapterKey::new("https://books.example/b/1", 4));
        assert_ne!(key, ChapterKey::new("https://books.example/b/2", 4));
    }

    #[test]
    fn test_stats_display() {
        let stats = PreloadStats {
            cache_hits: 10,
            cache_misses: 5,
            preload_success: 7,
            preload_failures: 2,
            current_cache_size: 4,
        };

        let display = stats.to_string();
        assert!(display.contains("hits: 10"));
        assert!(display.contains("failures: 2"));
    }
}
