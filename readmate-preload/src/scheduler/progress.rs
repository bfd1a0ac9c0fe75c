//! Reading-progress input and preload window selection

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Progress changes smaller than this (in percentage points) are ignored
pub const PROGRESS_STEP: f64 = 5.0;

/// Scroll position reported by the reader view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgressEvent {
    /// Chapter currently on screen
    pub chapter_index: usize,

    /// Position within that chapter, 0-100
    pub progress: f64,

    /// Number of chapters in the book
    pub total_chapters: usize,
}

impl ReadingProgressEvent {
    pub fn new(chapter_index: usize, progress: f64, total_chapters: usize) -> Self {
        Self {
            chapter_index,
            progress,
            total_chapters,
        }
    }
}

/// Chapters to fetch ahead of `current`: up to `chapter_count` indices after
/// it, never past the last chapter
pub fn preload_window(current: usize, chapter_count: usize, total_chapters: usize) -> Range<usize> {
    let start = current.saturating_add(1);
    let end = current
        .saturating_add(chapter_count)
        .saturating_add(1)
        .min(total_chapters);

    if start >= end {
        start..start
    } else {
        start..end
    }
}

/// Whether `progress` moved far enough from the last trigger to matter
pub fn passes_step(progress: f64, last_triggered: f64) -> bool {
    (progress - last_triggered).abs() >= PROGRESS_STEP
}
