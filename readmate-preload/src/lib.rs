//! # readmate-preload
//!
//! Predictive chapter preloading for a reader-server client.
//!
//! ## Features
//!
//! - Bounded chapter cache with LRU eviction and one-hour expiry
//! - Progress-driven speculative fetching of the next chapters
//! - Deduplicated task queue drained by a single background loop
//! - Per-fetch timeout and exponential-backoff retry
//! - Cache-first chapter reads with hit/miss statistics
//! - reqwest client for the reader server's book API
//!
//! ## Reading with preloading
//!
//! ```no_run
//! use readmate_preload::{PreloadConfig, PreloadManager, ReaderApiClient, ReadingProgressEvent};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> readmate_preload::Result<()> {
//!     let client = Arc::new(ReaderApiClient::new("http://localhost:1122/reader3"));
//!     let book = client.get_bookshelf().await?.remove(0);
//!     let chapters = client.get_chapter_list(&book.book_url).await?;
//!
//!     let manager = PreloadManager::new(client, PreloadConfig::from_env()?);
//!     manager.set_current_book(&book.book_url, chapters.len()).await;
//!
//!     let chapter = manager.get_chapter_content(&book.book_url, 0).await?;
//!     println!("{}\n\n{}", chapter.title, chapter.content);
//!
//!     // Past the trigger point: chapters 1 and 2 are fetched in the background
//!     manager
//!         .on_reading_progress(ReadingProgressEvent::new(0, 60.0, chapters.len()))
//!         .await;
//!
//!     println!("{:?}", manager.stats().await);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom content sources
//!
//! Anything implementing [`ContentFetcher`] can feed the manager:
//!
//! ```
//! use futures::future::BoxFuture;
//! use readmate_preload::{ChapterContent, ContentFetcher, Result};
//!
//! struct Static;
//!
//! impl ContentFetcher for Static {
//!     fn fetch_chapter<'a>(
//!         &'a self,
//!         _book_id: &'a str,
//!         chapter_index: usize,
//!     ) -> BoxFuture<'a, Result<ChapterContent>> {
//!         Box::pin(async move {
//!             Ok(ChapterContent::new(format!("Chapter {}", chapter_index + 1), "..."))
//!         })
//!     }
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod scheduler;

// Re-export main types for convenience
pub use cache::{CacheEntry, ChapterKey, PreloadCache, PreloadStats, CACHE_ENTRY_MAX_AGE};
pub use client::{Book, Chapter, ReaderApiClient};
pub use config::{PreloadConfig, PreloadConfigBuilder};
pub use error::{PreloadError, Result};
pub use fetcher::{ChapterContent, ContentFetcher};
pub use scheduler::{
    PreloadManager, PreloadManagerStats, PreloadStatus, PreloadTask, ReadingProgressEvent,
};
