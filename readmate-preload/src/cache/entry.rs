//! Cached chapter entries

use crate::fetcher::ChapterContent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached chapter with its insertion and last-access timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached chapter
    pub content: ChapterContent,

    /// When the entry was inserted
    pub cache_time: DateTime<Utc>,

    /// Last time the entry was read
    pub access_time: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with `now`
    pub fn new(content: ChapterContent, now: DateTime<Utc>) -> Self {
        Self {
            content,
            cache_time: now,
            access_time: now,
        }
    }

    /// Mark the entry as read at `now`
    pub fn mark_accessed(&mut self, now: DateTime<Utc>) {
        self.access_time = now;
    }

    /// Age of the entry relative to `now`
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.cache_time)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// Whether the entry is older than `max_age` at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age_at(now) > max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_at(now: DateTime<Utc>) -> CacheEntry {
        CacheEntry::new(ChapterContent::new("Chapter 1", "body"), now)
    }

    #[test]
    fn test_entry_creation() {
        let now = Utc::now();
        let entry = entry_at(now);
        assert_eq!(entry.cache_time, now);
        assert_eq!(entry.access_time, now);
    }

    #[test]
    fn test_mark_accessed_keeps_cache_time() {
        let now = Utc::now();
        let mut entry = entry_at(now);

        let later = now + chrono::Duration::minutes(5);
        entry.mark_accessed(later);

        assert_eq!(entry.access_time, later);
        assert_eq!(entry.cache_time, now);
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let entry = entry_at(now);
        let hour = Duration::from_secs(3600);

        assert!(!entry.is_expired_at(now + chrono::Duration::minutes(59), hour));
        assert!(entry.is_expired_at(now + chrono::Duration::minutes(61), hour));
        // Clock skew backwards never counts as expired
        assert!(!entry.is_expired_at(now - chrono::Duration::minutes(5), hour));
    }
}
