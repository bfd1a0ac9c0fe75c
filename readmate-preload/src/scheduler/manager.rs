//! Progress-driven chapter preloading
//!
//! The manager owns the chapter cache and a deduplicated queue of speculative
//! fetches. Reading-progress events fill the queue; a single drain loop works
//! through it one chapter at a time, with a per-fetch deadline and exponential
//! backoff on failure. Direct reads go through the cache first.

use crate::cache::{ChapterKey, PreloadCache, PreloadStats};
use crate::config::PreloadConfig;
use crate::error::{PreloadError, Result};
use crate::fetcher::{ChapterContent, ContentFetcher};
use crate::scheduler::progress::{passes_step, preload_window, ReadingProgressEvent};
use crate::scheduler::task::PreloadTask;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Retries allowed after the first failed attempt
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Backoff before retry `n` is `RETRY_DELAY_BASE * 2^n`
pub const RETRY_DELAY_BASE: Duration = Duration::from_millis(2000);

/// Deadline for a single speculative fetch
pub const PRELOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between consecutive speculative fetches
pub const INTER_TASK_DELAY: Duration = Duration::from_millis(500);

/// Interval of the background expiry sweep
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Backoff before the retry that follows `attempt` earlier retries
pub fn retry_delay(attempt: u32) -> Duration {
    RETRY_DELAY_BASE * 2u32.saturating_pow(attempt)
}

/// Diagnostics snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadManagerStats {
    pub cache: PreloadStats,
    pub hit_rate: f64,
    pub queue_size: usize,
    pub is_preloading: bool,
}

#[derive(Debug, Clone)]
struct CurrentBook {
    book_id: String,
    total_chapters: usize,
}

struct ManagerState {
    cache: PreloadCache,
    config: PreloadConfig,
    queue: HashMap<ChapterKey, PreloadTask>,
    current_book: Option<CurrentBook>,
    last_triggered_progress: f64,
    next_task_id: u64,
    /// Bumped whenever cached content stops being trusted (source swap, dispose)
    source_generation: u64,
}

impl ManagerState {
    fn clear_queue(&mut self) {
        let count = self.queue.len();
        self.queue.clear();
        if count > 0 {
            info!("Cleared {} pending preload tasks", count);
        }
    }

    /// Keys of idle tasks past their backoff, in chapter order
    fn due_tasks(&self, now: Instant) -> Vec<ChapterKey> {
        let mut due: Vec<&PreloadTask> = self
            .queue
            .values()
            .filter(|task| task.is_due(now))
            .collect();
        due.sort_by(|a, b| {
            a.chapter_index
                .cmp(&b.chapter_index)
                .then_with(|| a.book_id.cmp(&b.book_id))
        });
        due.into_iter().map(PreloadTask::key).collect()
    }

    fn has_due_tasks(&self, now: Instant) -> bool {
        self.config.enabled && self.queue.values().any(|task| task.is_due(now))
    }

    fn holds_task(&self, key: &ChapterKey, task_id: u64) -> bool {
        self.queue.get(key).is_some_and(|task| task.id == task_id)
    }
}

struct ManagerInner {
    state: Mutex<ManagerState>,
    fetcher: RwLock<Arc<dyn ContentFetcher>>,
    is_preloading: AtomicBool,
}

/// Holds the single drain slot; releases it on drop
struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ManagerInner {
    /// Active fetcher and the source generation it belongs to
    ///
    /// Lock order is fetcher then state, matching `update_api_client`.
    async fn current_source(&self) -> (Arc<dyn ContentFetcher>, u64) {
        let fetcher = self.fetcher.read().await;
        let generation = self.state.lock().await.source_generation;
        (Arc::clone(&fetcher), generation)
    }

    /// Start a drain loop unless one is already running
    fn kick(self: &Arc<Self>) {
        if self.is_preloading.load(Ordering::Acquire) {
            return;
        }
        tokio::spawn(Arc::clone(self).drain());
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let Some(guard) = DrainGuard::try_acquire(&self.is_preloading) else {
                return;
            };
            self.run_passes().await;
            drop(guard);

            // Work queued between the last pass and releasing the slot
            if !self.state.lock().await.has_due_tasks(Instant::now()) {
                return;
            }
        }
    }

    async fn run_passes(self: &Arc<Self>) {
        loop {
            let batch = {
                let state = self.state.lock().await;
                if !state.config.enabled {
                    return;
                }
                state.due_tasks(Instant::now())
            };

            if batch.is_empty() {
                return;
            }
            debug!("Draining {} preload tasks", batch.len());

            for key in batch {
                if !self.state.lock().await.config.enabled {
                    debug!("Preloading disabled, stopping drain");
                    return;
                }

                if self.execute_task(&key).await {
                    tokio::time::sleep(INTER_TASK_DELAY).await;
                }
            }
        }
    }

    /// Fetch one queued chapter; false if the task was gone or not due
    async fn execute_task(self: &Arc<Self>, key: &ChapterKey) -> bool {
        let task_id = {
            let mut state = self.state.lock().await;
            match state.queue.get_mut(key) {
                Some(task) if task.is_due(Instant::now()) => {
                    task.mark_loading();
                    task.id
                }
                _ => return false,
            }
        };

        debug!("Preloading chapter {}", key);
        let (fetcher, generation) = self.current_source().await;
        let result = match tokio::time::timeout(
            PRELOAD_TIMEOUT,
            fetcher.fetch_chapter(&key.book_id, key.chapter_index),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(PreloadError::TimeoutError {
                timeout_ms: PRELOAD_TIMEOUT.as_millis() as u64,
                context: format!("preload {}", key),
            }),
        };

        let mut state = self.state.lock().await;
        match result {
            Ok(_) if state.source_generation != generation => {
                debug!("Discarding {} fetched from a replaced source", key);
            }
            Ok(content) => {
                state.cache.set(&key.book_id, key.chapter_index, content);
                if state.holds_task(key, task_id) {
                    if let Some(mut task) = state.queue.remove(key) {
                        task.mark_completed();
                        debug!(
                            "Preload task {} {:?} after {} retries",
                            key, task.status, task.retry_count
                        );
                    }
                }
            }
            Err(e) => {
                warn!("Preload failed for {}: {}", key, e);
                state.cache.record_preload_failure();
                self.handle_failure(&mut state, key, task_id);
            }
        }

        true
    }

    fn handle_failure(self: &Arc<Self>, state: &mut ManagerState, key: &ChapterKey, task_id: u64) {
        let Some(task) = state
            .queue
            .get_mut(key)
            .filter(|task| task.id == task_id)
        else {
            debug!("Task {} left the queue during its fetch, not retrying", key);
            return;
        };

        if task.retry_count < MAX_RETRY_ATTEMPTS {
            let delay = retry_delay(task.retry_count);
            task.schedule_retry(Instant::now() + delay);
            warn!(
                "Retrying preload of {} in {:?} (retry {}/{})",
                key, delay, task.retry_count, MAX_RETRY_ATTEMPTS
            );
            tokio::spawn(retry_after(Arc::downgrade(self), key.clone(), task_id, delay));
        } else {
            task.mark_failed();
            error!(
                "Preload of {} {:?} after {} retries, giving up",
                key, task.status, task.retry_count
            );
            state.queue.remove(key);
        }
    }
}

/// Re-trigger the drain loop once a backoff elapses, if the same task is
/// still queued
async fn retry_after(inner: Weak<ManagerInner>, key: ChapterKey, task_id: u64, delay: Duration) {
    tokio::time::sleep(delay).await;

    let Some(inner) = inner.upgrade() else {
        return;
    };

    let still_queued = inner.state.lock().await.holds_task(&key, task_id);
    if still_queued {
        inner.kick();
    } else {
        debug!("Dropping stale retry for {}", key);
    }
}

/// Background task removing expired cache entries
async fn sweep_expired(inner: Weak<ManagerInner>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);

    loop {
        ticker.tick().await;

        let Some(inner) = inner.upgrade() else {
            break;
        };

        let removed = inner.state.lock().await.cache.clean_expired();
        if removed > 0 {
            debug!("Expiry sweep removed {} chapters", removed);
        }
    }
}

/// Chapter preloader and cache-first reader
///
/// Must be created inside a tokio runtime: construction starts the periodic
/// expiry sweep, and reading-progress events spawn the drain loop.
///
/// # Example
/// ```no_run
/// use readmate_preload::{PreloadConfig, PreloadManager, ReaderApiClient, ReadingProgressEvent};
/// use std::sync::Arc;
///
/// # async fn example() -> readmate_preload::Result<()> {
/// let client = Arc::new(ReaderApiClient::new("http://localhost:1122/reader3"));
/// let manager = PreloadManager::new(client, PreloadConfig::default());
///
/// manager.set_current_book("https://books.example/b/1", 40).await;
/// let chapter = manager.get_chapter_content("https://books.example/b/1", 3).await?;
/// println!("{}", chapter.title);
///
/// // Halfway through chapter 3: chapters 4 and 5 are fetched in the background
/// manager
///     .on_reading_progress(ReadingProgressEvent::new(3, 55.0, 40))
///     .await;
/// # Ok(())
/// # }
/// ```
pub struct PreloadManager {
    inner: Arc<ManagerInner>,
    sweeper: JoinHandle<()>,
}

impl PreloadManager {
    /// Create a manager fetching through `fetcher`
    pub fn new(fetcher: Arc<dyn ContentFetcher>, config: PreloadConfig) -> Self {
        info!("Initializing preload manager with config: {:?}", config);

        let cache = PreloadCache::new(config.max_cache_size);
        let inner = Arc::new(ManagerInner {
            state: Mutex::new(ManagerState {
                cache,
                config,
                queue: HashMap::new(),
                current_book: None,
                last_triggered_progress: 0.0,
                next_task_id: 0,
                source_generation: 0,
            }),
            fetcher: RwLock::new(fetcher),
            is_preloading: AtomicBool::new(false),
        });

        let sweeper = tokio::spawn(sweep_expired(Arc::downgrade(&inner), CLEANUP_INTERVAL));

        Self { inner, sweeper }
    }

    /// Replace the active configuration
    ///
    /// The cache is resized immediately. Disabling preloading clears the
    /// queue; a fetch already in flight still runs to completion.
    pub async fn update_config(&self, config: PreloadConfig) {
        let mut state = self.inner.state.lock().await;

        state.cache.set_max_size(config.max_cache_size);
        if !config.enabled {
            state.clear_queue();
        }

        info!("Preload config updated: {:?}", config);
        state.config = config;
    }

    /// Track the book being read
    ///
    /// Switching to a different book drops pending tasks and resets the
    /// progress watermark. Cached chapters of the previous book stay.
    pub async fn set_current_book(&self, book_id: impl Into<String>, total_chapters: usize) {
        let book_id = book_id.into();
        let mut state = self.inner.state.lock().await;

        let switched = state
            .current_book
            .as_ref()
            .map_or(true, |book| book.book_id != book_id);
        if switched {
            state.clear_queue();
            state.last_triggered_progress = 0.0;
        }

        info!(
            "Current book: {} ({} chapters)",
            book_id, total_chapters
        );
        state.current_book = Some(CurrentBook {
            book_id,
            total_chapters,
        });
    }

    /// React to a reading-progress update; returns the number of chapters queued
    pub async fn on_reading_progress(&self, event: ReadingProgressEvent) -> usize {
        let enqueued = {
            let mut state = self.inner.state.lock().await;

            let book_id = match state.current_book.as_ref() {
                Some(book) if state.config.enabled => book.book_id.clone(),
                _ => {
                    debug!(
                        "Ignoring progress: enabled={}, has_book={}",
                        state.config.enabled,
                        state.current_book.is_some()
                    );
                    return 0;
                }
            };

            if !passes_step(event.progress, state.last_triggered_progress) {
                debug!(
                    "Progress {}% within step of last trigger {}%, skipping",
                    event.progress, state.last_triggered_progress
                );
                return 0;
            }

            if event.progress < state.config.trigger_progress {
                debug!(
                    "Progress {}% below trigger {}%",
                    event.progress, state.config.trigger_progress
                );
                return 0;
            }

            state.last_triggered_progress = event.progress;

            let window = preload_window(
                event.chapter_index,
                state.config.chapter_count,
                event.total_chapters,
            );
            debug!("Preload window for {}: {:?}", book_id, window);

            let mut enqueued = 0;
            for chapter_index in window {
                let key = ChapterKey::new(book_id.clone(), chapter_index);
                if state.cache.has(&book_id, chapter_index) || state.queue.contains_key(&key) {
                    continue;
                }

                let id = state.next_task_id;
                state.next_task_id += 1;
                state
                    .queue
                    .insert(key, PreloadTask::new(id, book_id.clone(), chapter_index));
                enqueued += 1;
            }

            if enqueued > 0 {
                info!("Queued {} chapters of {} for preloading", enqueued, book_id);
            }
            enqueued
        };

        self.inner.kick();
        enqueued
    }

    /// Read a chapter, from the cache when possible
    ///
    /// A miss fetches directly (no queue, deadline or retry) and caches the
    /// result. Fetch errors are returned to the caller.
    pub async fn get_chapter_content(
        &self,
        book_id: &str,
        chapter_index: usize,
    ) -> Result<ChapterContent> {
        let cached = self
            .inner
            .state
            .lock()
            .await
            .cache
            .get(book_id, chapter_index);
        if let Some(content) = cached {
            return Ok(content);
        }

        debug!("Fetching {}#{} directly", book_id, chapter_index);
        let (fetcher, generation) = self.inner.current_source().await;
        let content = fetcher.fetch_chapter(book_id, chapter_index).await?;

        let mut state = self.inner.state.lock().await;
        if state.source_generation == generation {
            state.cache.set(book_id, chapter_index, content.clone());
        } else {
            debug!(
                "Not caching {}#{}, content source changed during the fetch",
                book_id, chapter_index
            );
        }

        Ok(content)
    }

    /// Swap the content source; pending tasks and all cached chapters are dropped
    ///
    /// Fetches already in flight against the old source still complete, but
    /// their results are not cached.
    pub async fn update_api_client(&self, fetcher: Arc<dyn ContentFetcher>) {
        let mut current = self.inner.fetcher.write().await;
        *current = fetcher;

        let mut state = self.inner.state.lock().await;
        state.source_generation += 1;
        state.clear_queue();
        state.cache.clear();
        info!("Content source replaced, preload state reset");
    }

    /// Remove expired chapters now instead of waiting for the sweep
    pub async fn clean_expired(&self) -> usize {
        self.inner.state.lock().await.cache.clean_expired()
    }

    pub async fn stats(&self) -> PreloadManagerStats {
        let state = self.inner.state.lock().await;

        PreloadManagerStats {
            cache: state.cache.stats(),
            hit_rate: state.cache.hit_rate(),
            queue_size: state.queue.len(),
            is_preloading: self.inner.is_preloading.load(Ordering::Acquire),
        }
    }

    /// Pending and in-flight tasks in chapter order
    pub async fn queued_tasks(&self) -> Vec<PreloadTask> {
        let state = self.inner.state.lock().await;
        let mut tasks: Vec<PreloadTask> = state.queue.values().cloned().collect();
        tasks.sort_by(|a, b| {
            a.chapter_index
                .cmp(&b.chapter_index)
                .then_with(|| a.book_id.cmp(&b.book_id))
        });
        tasks
    }

    /// Whether a chapter is cached (does not affect hit/miss counters)
    pub async fn is_cached(&self, book_id: &str, chapter_index: usize) -> bool {
        self.inner.state.lock().await.cache.has(book_id, chapter_index)
    }

    /// No drain loop running and nothing queued
    pub async fn is_idle(&self) -> bool {
        let queue_empty = self.inner.state.lock().await.queue.is_empty();
        queue_empty && !self.inner.is_preloading.load(Ordering::Acquire)
    }

    /// Currently tracked book and its chapter count
    pub async fn current_book(&self) -> Option<(String, usize)> {
        self.inner
            .state
            .lock()
            .await
            .current_book
            .as_ref()
            .map(|book| (book.book_id.clone(), book.total_chapters))
    }

    /// Drop pending tasks and cached chapters and stop the expiry sweep
    pub async fn dispose(&self) {
        self.sweeper.abort();

        let mut state = self.inner.state.lock().await;
        state.source_generation += 1;
        state.clear_queue();
        state.cache.clear();
        info!("Preload manager disposed");
    }
}

impl Drop for PreloadManager {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}
