//! Shared test helpers: a scripted in-memory content fetcher

#![allow(dead_code)]

use futures::future::BoxFuture;
use readmate_preload::{ChapterContent, ContentFetcher, PreloadError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Outcome of one scripted fetch
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Succeed,
    Fail,
    /// Never answers within the preload deadline
    Hang,
}

/// Fetcher whose per-chapter results are scripted; unscripted fetches succeed
pub struct MockFetcher {
    label: String,
    delay: Duration,
    scripts: Mutex<HashMap<(String, usize), VecDeque<Outcome>>>,
    calls: Mutex<Vec<(String, usize)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::labelled("mock")
    }

    /// Chapter titles are prefixed with `label`, to tell sources apart
    pub fn labelled(label: &str) -> Self {
        Self {
            label: label.to_string(),
            delay: Duration::ZERO,
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every fetch takes `delay` before resolving
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn script(self, book_id: &str, chapter_index: usize, outcomes: &[Outcome]) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert((book_id.to_string(), chapter_index), outcomes.iter().copied().collect());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, book_id: &str, chapter_index: usize) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(book, index)| book == book_id && *index == chapter_index)
            .count()
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn title_for(&self, chapter_index: usize) -> String {
        format!("{} chapter {}", self.label, chapter_index)
    }
}

impl ContentFetcher for MockFetcher {
    fn fetch_chapter<'a>(
        &'a self,
        book_id: &'a str,
        chapter_index: usize,
    ) -> BoxFuture<'a, Result<ChapterContent>> {
        Box::pin(async move {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            let _in_flight = InFlight(&self.in_flight);

            self.calls
                .lock()
                .unwrap()
                .push((book_id.to_string(), chapter_index));

            let outcome = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(&(book_id.to_string(), chapter_index))
                .and_then(VecDeque::pop_front)
                .unwrap_or(Outcome::Succeed);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match outcome {
                Outcome::Succeed => Ok(ChapterContent::new(
                    self.title_for(chapter_index),
                    format!("{} text", book_id),
                )),
                Outcome::Fail => Err(PreloadError::FetchError(format!(
                    "scripted failure for {}#{}",
                    book_id, chapter_index
                ))),
                Outcome::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(PreloadError::FetchError("hung fetch resumed".to_string()))
                }
            }
        })
    }
}
