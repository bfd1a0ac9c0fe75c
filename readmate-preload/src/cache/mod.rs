//! # Chapter Cache
//!
//! Bounded, key-addressed storage for fetched chapters.
//!
//! ## Features
//!
//! - **Composite keys**: entries are addressed by (book identifier, chapter index)
//! - **LRU Eviction**: inserting into a full cache drops the least recently read chapter
//! - **Age-Based Expiry**: entries older than one hour are removed by an explicit sweep
//! - **Statistics**: hit/miss counters, cache writes and failed preloads
//!
//! ## Example
//!
//! ```rust
//! use readmate_preload::cache::PreloadCache;
//! use readmate_preload::ChapterContent;
//!
//! let mut cache = PreloadCache::new(2);
//! cache.set("book", 0, ChapterContent::new("Chapter 1", "..."));
//! cache.set("book", 1, ChapterContent::new("Chapter 2", "..."));
//!
//! // Reading chapter 0 makes chapter 1 the eviction candidate
//! assert!(cache.get("book", 0).is_some());
//! cache.set("book", 2, ChapterContent::new("Chapter 3", "..."));
//!
//! assert!(cache.has("book", 0));
//! assert!(!cache.has("book", 1));
//! assert_eq!(cache.hit_rate(), 100.0);
//! ```

pub mod entry;
pub mod store;
pub mod types;

pub use entry::CacheEntry;
pub use store::{PreloadCache, CACHE_ENTRY_MAX_AGE};
pub use types::{ChapterKey, PreloadStats};
