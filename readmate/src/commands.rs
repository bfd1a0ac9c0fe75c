//! Subcommand implementations

use anyhow::{bail, Context, Result};
use readmate_preload::{
    Book, Chapter, ChapterContent, PreloadConfig, PreloadManager, PreloadManagerStats,
    ReaderApiClient, ReadingProgressEvent,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Arguments of the `read` subcommand
#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub book_url: String,
    pub index: usize,
    /// Reading position to report after the chapter is shown
    pub progress: Option<f64>,
    /// Longest wait for background preloading to settle
    pub wait: Duration,
}

#[derive(Debug)]
pub struct ReadOutcome {
    pub chapter: ChapterContent,
    /// Present when a progress event was sent
    pub stats: Option<PreloadManagerStats>,
}

pub async fn shelf(client: &ReaderApiClient) -> Result<Vec<Book>> {
    client
        .get_bookshelf()
        .await
        .context("failed to load bookshelf")
}

pub async fn chapters(client: &ReaderApiClient, book_url: &str) -> Result<Vec<Chapter>> {
    client
        .get_chapter_list(book_url)
        .await
        .with_context(|| format!("failed to load chapters of {}", book_url))
}

/// Read one chapter through a preload manager, optionally reporting progress
pub async fn read(
    client: Arc<ReaderApiClient>,
    config: PreloadConfig,
    request: &ReadRequest,
) -> Result<ReadOutcome> {
    let total = chapters(&client, &request.book_url).await?.len();
    if request.index >= total {
        bail!(
            "chapter {} out of range, {} has {} chapters",
            request.index,
            request.book_url,
            total
        );
    }

    let manager = PreloadManager::new(client, config);
    manager.set_current_book(&request.book_url, total).await;

    let chapter = manager
        .get_chapter_content(&request.book_url, request.index)
        .await
        .with_context(|| format!("failed to read chapter {}", request.index))?;

    let stats = match request.progress {
        Some(progress) => {
            let event = ReadingProgressEvent::new(request.index, progress, total);
            let queued = manager.on_reading_progress(event).await;
            info!("{} chapters queued for preloading", queued);

            wait_until_idle(&manager, request.wait).await;
            Some(manager.stats().await)
        }
        None => None,
    };

    manager.dispose().await;
    Ok(ReadOutcome { chapter, stats })
}

async fn wait_until_idle(manager: &PreloadManager, wait: Duration) {
    let deadline = Instant::now() + wait;

    while !manager.is_idle().await {
        if Instant::now() >= deadline {
            warn!("Preloading still running after {:?}", wait);
            return;
        }
        sleep(IDLE_POLL_INTERVAL).await;
    }
}

pub fn format_shelf(books: &[Book]) -> String {
    if books.is_empty() {
        return "Bookshelf is empty.".to_string();
    }

    let mut lines = Vec::new();
    for book in books {
        let progress = match (book.dur_chapter_index, book.total_chapter_num) {
            (Some(current), Some(total)) => format!("  [{}/{}]", current + 1, total),
            _ => String::new(),
        };
        lines.push(format!("{} by {}{}", book.name, book.author, progress));
        lines.push(format!("  {}", book.book_url));
        if let Some(latest) = &book.latest_chapter_title {
            lines.push(format!("  latest: {}", latest));
        }
    }
    lines.join("\n") + "\n"
}

pub fn format_chapters(chapters: &[Chapter]) -> String {
    chapters
        .iter()
        .map(|chapter| format!("{:>5}  {}\n", chapter.index, chapter.title))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(progress: Option<usize>) -> Book {
        Book {
            name: "The Long Road".to_string(),
            author: "A. Writer".to_string(),
            book_url: "https://books.example/b/1".to_string(),
            cover_url: None,
            dur_chapter_index: progress,
            total_chapter_num: Some(40),
            latest_chapter_title: None,
        }
    }

    #[test]
    fn test_format_shelf() {
        assert_eq!(format_shelf(&[]), "Bookshelf is empty.");

        let out = format_shelf(&[book(Some(2))]);
        assert!(out.starts_with("The Long Road by A. Writer  [3/40]\n"));
        assert!(out.contains("  https://books.example/b/1\n"));

        let out = format_shelf(&[book(None)]);
        assert!(!out.contains('['));
    }

    #[test]
    fn test_format_shelf_exact_layout() {
        let mut latest = book(Some(0));
        latest.latest_chapter_title = Some("Homecoming".to_string());

        assert_eq!(
            format_shelf(&[latest, book(None)]),
            "The Long Road by A. Writer  [1/40]\n\
             \x20 https://books.example/b/1\n\
             \x20 latest: Homecoming\n\
             The Long Road by A. Writer\n\
             \x20 https://books.example/b/1\n"
        );
    }

    #[test]
    fn test_format_chapters() {
        let chapters = vec![Chapter {
            title: "Departure".to_string(),
            url: "/c/0".to_string(),
            index: 0,
        }];
        assert_eq!(format_chapters(&chapters), "    0  Departure\n");
    }
}
