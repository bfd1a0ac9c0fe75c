use crate::cache::ChapterKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Lifecycle of a speculative fetch
///
/// `Idle -> Loading -> Completed | Idle (retry) | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreloadStatus {
    Idle,
    Loading,
    Completed,
    Failed,
}

/// One pending or in-flight speculative chapter fetch
#[derive(Debug, Clone, Serialize)]
pub struct PreloadTask {
    /// Unique per manager; distinguishes a re-queued key from its predecessor
    pub id: u64,
    pub book_id: String,
    pub chapter_index: usize,
    pub status: PreloadStatus,
    /// Retries scheduled so far
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    /// Backoff deadline; the task is not drained before this instant
    #[serde(skip)]
    pub not_before: Option<Instant>,
}

impl PreloadTask {
    pub fn new(id: u64, book_id: impl Into<String>, chapter_index: usize) -> Self {
        Self {
            id,
            book_id: book_id.into(),
            chapter_index,
            status: PreloadStatus::Idle,
            retry_count: 0,
            created_at: Utc::now(),
            not_before: None,
        }
    }

    pub fn key(&self) -> ChapterKey {
        ChapterKey::new(self.book_id.clone(), self.chapter_index)
    }

    /// Idle and past any backoff deadline
    pub fn is_due(&self, now: Instant) -> bool {
        self.status == PreloadStatus::Idle && self.not_before.map_or(true, |at| at <= now)
    }

    pub fn mark_loading(&mut self) {
        self.status = PreloadStatus::Loading;
    }

    /// Return to `Idle` for another attempt after `retry_at`
    pub fn schedule_retry(&mut self, retry_at: Instant) {
        self.retry_count += 1;
        self.status = PreloadStatus::Idle;
        self.not_before = Some(retry_at);
    }

    pub fn mark_completed(&mut self) {
        self.status = PreloadStatus::Completed;
        self.not_before = None;
    }

    pub fn mark_failed(&mut self) {
        self.status = PreloadStatus::Failed;
        self.not_before = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_task_is_idle_and_due() {
        let task = PreloadTask::new(1, "book", 3);
        assert_eq!(task.status, PreloadStatus::Idle);
        assert_eq!(task.retry_count, 0);
        assert!(task.is_due(Instant::now()));
        assert_eq!(task.key(), ChapterKey::new("book", 3));
    }

    #[test]
    fn test_retry_waits_for_backoff() {
        let mut task = PreloadTask::new(1, "book", 3);
        task.mark_loading();
        assert!(!task.is_due(Instant::now()));

        let now = Instant::now();
        task.schedule_retry(now + Duration::from_secs(2));

        assert_eq!(task.status, PreloadStatus::Idle);
        assert_eq!(task.retry_count, 1);
        assert!(!task.is_due(now));
        assert!(task.is_due(now + Duration::from_secs(2)));
    }

    #[test]
    fn test_terminal_states() {
        let mut task = PreloadTask::new(1, "book", 0);
        task.mark_completed();
        assert_eq!(task.status, PreloadStatus::Completed);
        assert!(!task.is_due(Instant::now()));

        let mut task = PreloadTask::new(2, "book", 0);
        task.mark_failed();
        assert_eq!(task.status, PreloadStatus::Failed);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PreloadStatus::Loading).unwrap(),
            "\"loading\""
        );
    }
}
